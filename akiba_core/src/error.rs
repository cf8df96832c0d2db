//! Error types for the akiba core library
//!
//! Errors are grouped by where they come from. Absent remote records and
//! collisions are modelled as values, never as errors.

use thiserror::Error;

pub mod internal;
pub mod io;
pub mod remote;
pub mod template;
pub mod validation;

pub use self::io::{IoError, IoErrorKind};
pub use self::remote::RemoteError;
pub use self::template::TemplateError;
pub use self::validation::ValidationError;
pub use crate::protocol::error::ProtocolError;
pub use internal::InternalError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the akiba core library
///
/// - I/O errors: missing or invalid filesystem paths, failed relocations
/// - Protocol errors: UDP session failures, including bans and rejected clients
/// - Validation errors: unusable configuration or parameters
/// - Template errors: unknown tags or modifiers in a rename format
/// - Remote errors: HTTP sources (title corpus, list feed, search providers)
/// - Internal errors: hashing and cache serialization failures
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

impl Error {
    /// Whether the error must abort the remaining work queue
    ///
    /// Protocol failures end the run so a rate limit or ban window is not
    /// escalated by further requests.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::Template(_))
    }
}
