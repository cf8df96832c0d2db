//! Typed AniDB commands and responses
//!
//! Each command knows its wire name and its parameters in the order the
//! server documents them. Parameters marked secret are masked whenever a
//! command is rendered for logging.

pub mod auth;
pub mod command;
pub mod file;
pub mod mylist;
pub mod response;

pub use auth::{AuthCommand, EncryptCommand, LogoutCommand};
pub use command::Command;
pub use file::{FILE_AMASK, FILE_FMASK, FileCommand, FileRecord, parse_file_record};
pub use mylist::{MyListAddCommand, MyListCommand, MylistState};
pub use response::{Response, ResponseParser};

use crate::protocol::error::{ProtocolError, Result};
use std::fmt;

/// Parameter separator used in AniDB protocol
pub const PARAM_SEPARATOR: char = '|';

/// Newline encoding for multiline values
pub const ENCODED_NEWLINE: &str = "<br />";

/// Quote encoding
pub const ENCODED_QUOTE: &str = "`";

/// Pipe encoding
pub const ENCODED_PIPE: &str = "/";

const MASK: &str = "***";

/// Base trait for all AniDB commands
pub trait AniDBCommand: fmt::Debug + Send + Sync {
    /// Get the command name
    fn name(&self) -> &'static str;

    /// Get command parameters in wire order
    fn parameters(&self) -> Vec<(&'static str, String)>;

    /// Parameter keys whose values must never be logged
    fn secret_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    /// Check if this command requires authentication
    fn requires_auth(&self) -> bool {
        !matches!(self.name(), "ENCRYPT" | "AUTH")
    }

    /// Encode the command for transmission
    fn encode(&self) -> String {
        join_command(self.name(), self.parameters())
    }

    /// Render the command for logs with secret values replaced
    fn masked(&self) -> String {
        let secrets = self.secret_parameters();
        let params = self
            .parameters()
            .into_iter()
            .map(|(key, value)| {
                if secrets.contains(&key) {
                    (key, MASK.to_string())
                } else {
                    (key, value)
                }
            })
            .collect();
        join_command(self.name(), params)
    }
}

/// Join a command name and its parameters as `NAME k=v&k=v`
pub fn join_command(name: &str, params: Vec<(&'static str, String)>) -> String {
    if params.is_empty() {
        return name.to_string();
    }
    let joined = params
        .iter()
        .map(|(key, value)| format!("{key}={}", encode_value(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{name} {joined}")
}

/// Encode a value for AniDB protocol transmission
///
/// Option values use html form encoding for `&` and `<br />` for newlines.
/// Everything else is sent as-is and UTF-8 encoded at packet level.
pub fn encode_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 10);

    for ch in value.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '\n' => result.push_str(ENCODED_NEWLINE),
            '\r' => continue,
            _ => result.push(ch),
        }
    }

    result
}

/// Decode a value from AniDB protocol format
///
/// Reverses `encode_value` and maps the response-side escapes: a backtick
/// stands for a quote and a lone `/` for a pipe.
pub fn decode_value(value: &str) -> String {
    if value == ENCODED_PIPE {
        return PARAM_SEPARATOR.to_string();
    }
    value
        .replace("&amp;", "&")
        .replace(ENCODED_NEWLINE, "\n")
        .replace(ENCODED_QUOTE, "'")
}

/// Parse a raw response line into code and message
pub fn parse_response_header(line: &str) -> Result<(u16, String)> {
    let line = line.trim_end();
    if line.is_empty() {
        return Err(ProtocolError::decoding("empty response"));
    }

    let (code, message) = line.split_once(' ').unwrap_or((line, ""));
    let code = code
        .parse::<u16>()
        .map_err(|_| ProtocolError::decoding(format!("invalid response code: {code}")))?;

    Ok((code, message.to_string()))
}

/// Parse response fields from a data line
pub fn parse_response_fields(line: &str) -> Vec<String> {
    line.split(PARAM_SEPARATOR).map(decode_value).collect()
}
