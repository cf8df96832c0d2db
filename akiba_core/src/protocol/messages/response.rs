//! Response parsing

use crate::protocol::error::{ProtocolError, ResponseCode, Result};
use crate::protocol::messages::{parse_response_fields, parse_response_header};

/// A decoded server reply
///
/// The first line carries the code and message. AUTH and ENCRYPT put the
/// session key or salt in front of the message text. The optional second
/// line holds pipe separated data fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: ResponseCode,
    pub message: String,
    pub fields: Vec<String>,
}

impl Response {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code: ResponseCode(code),
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// First whitespace separated token of the message
    pub fn first_token(&self) -> Option<&str> {
        self.message.split_whitespace().next()
    }

    /// Convert the reply into a server error carrying its code and text
    pub fn into_error(self) -> ProtocolError {
        ProtocolError::server_error(self.code.0, self.message)
    }
}

/// Parser for raw response text
pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(raw_response: &str) -> Result<Response> {
        let mut lines = raw_response.lines();
        let header = lines
            .next()
            .ok_or_else(|| ProtocolError::decoding("empty response"))?;
        let (code, message) = parse_response_header(header)?;

        let fields = lines
            .find(|line| !line.trim().is_empty())
            .map(parse_response_fields)
            .unwrap_or_default();

        Ok(Response::new(code, message).with_fields(fields))
    }
}
