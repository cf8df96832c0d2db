//! Protocol error taxonomy and response codes

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Failures of the UDP session
///
/// Absent records (`320`, `321`) never appear here; the session maps them to
/// `None` before an error is built.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No answer from AniDB after {0:?}")]
    Timeout(Duration),

    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("Decoding error: {message}")]
    Decoding { message: String },

    #[error("Encryption error: {message}")]
    Encryption { message: String },

    #[error("Not connected to AniDB server")]
    NotConnected,

    /// Application level error answered by the server, surfaced verbatim
    #[error("AniDB server error: {code} - {message}")]
    ServerError { code: u16, message: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Invalid response format: expected {expected}, got {actual}")]
    InvalidResponse { expected: String, actual: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

impl ProtocolError {
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    pub fn encryption(message: impl Into<String>) -> Self {
        Self::Encryption {
            message: message.into(),
        }
    }

    pub fn server_error(code: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            code,
            message: message.into(),
        }
    }

    pub fn authentication_failed(reason: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            reason: reason.into(),
        }
    }

    pub fn invalid_response(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidResponse {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Response code carried by the error, if the server answered
    pub fn code(&self) -> Option<ResponseCode> {
        match self {
            Self::ServerError { code, .. } => Some(ResponseCode(*code)),
            _ => None,
        }
    }

    /// Whether waiting and running again later may succeed
    ///
    /// The session itself never retries; this only drives operator guidance.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout(_))
            || self.code().is_some_and(|code| code.is_transient())
    }

    /// Whether the session must log in again
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self.code(),
            Some(ResponseCode::LOGIN_FIRST | ResponseCode::INVALID_SESSION)
        )
    }

    /// Whether the user or client has been banned
    pub fn is_banned(&self) -> bool {
        matches!(
            self.code(),
            Some(ResponseCode::BANNED | ResponseCode::CLIENT_BANNED)
        )
    }
}

/// Response code returned by AniDB server
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResponseCode(pub u16);

impl ResponseCode {
    pub const LOGIN_ACCEPTED: Self = Self(200);
    pub const LOGIN_ACCEPTED_NEW_VERSION: Self = Self(201);
    pub const LOGGED_OUT: Self = Self(203);
    pub const ENCRYPTION_ENABLED: Self = Self(209);
    pub const MYLIST_ENTRY_ADDED: Self = Self(210);
    pub const FILE: Self = Self(220);
    pub const MYLIST: Self = Self(221);
    pub const MYLIST_ENTRY_EDITED: Self = Self(311);
    pub const FILE_ALREADY_IN_MYLIST: Self = Self(310);
    pub const NO_SUCH_FILE: Self = Self(320);
    pub const NO_SUCH_ENTRY: Self = Self(321);
    pub const NOT_LOGGED_IN: Self = Self(403);
    pub const LOGIN_FAILED: Self = Self(500);
    pub const LOGIN_FIRST: Self = Self(501);
    pub const ACCESS_DENIED: Self = Self(502);
    pub const CLIENT_VERSION_OUTDATED: Self = Self(503);
    pub const CLIENT_BANNED: Self = Self(504);
    pub const INVALID_SESSION: Self = Self(506);
    pub const BANNED: Self = Self(555);
    pub const UNKNOWN_COMMAND: Self = Self(598);
    pub const SERVER_BUSY: Self = Self(602);

    pub fn is_success(&self) -> bool {
        matches!(self.0, 200..=299)
    }

    /// Codes at or above 500 abort the session
    pub fn is_fatal(&self) -> bool {
        self.0 >= 500
    }

    /// Absent record answers
    pub fn is_not_found(&self) -> bool {
        matches!(*self, Self::NO_SUCH_FILE | Self::NO_SUCH_ENTRY)
    }

    /// Server side failures that clear up on their own
    pub fn is_transient(&self) -> bool {
        matches!(self.0, 600..=604)
    }

    pub fn description(&self) -> &'static str {
        match self.0 {
            200 => "LOGIN ACCEPTED",
            201 => "LOGIN ACCEPTED - NEW VERSION AVAILABLE",
            203 => "LOGGED OUT",
            209 => "ENCRYPTION ENABLED",
            210 => "MYLIST ENTRY ADDED",
            220 => "FILE",
            221 => "MYLIST",
            310 => "FILE ALREADY IN MYLIST",
            311 => "MYLIST ENTRY EDITED",
            320 => "NO SUCH FILE",
            321 => "NO SUCH ENTRY",
            403 => "NOT LOGGED IN",
            500 => "LOGIN FAILED",
            501 => "LOGIN FIRST",
            502 => "ACCESS DENIED",
            503 => "CLIENT VERSION OUTDATED",
            504 => "CLIENT BANNED",
            505 => "ILLEGAL INPUT OR ACCESS DENIED",
            506 => "INVALID SESSION",
            509 => "NO SUCH ENCRYPTION TYPE",
            555 => "BANNED",
            598 => "UNKNOWN COMMAND",
            600 => "INTERNAL SERVER ERROR",
            601 => "ANIDB OUT OF SERVICE",
            602 => "SERVER BUSY",
            604 => "TIMEOUT - DELAY AND RESUBMIT",
            _ => "UNKNOWN RESPONSE CODE",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.description())
    }
}
