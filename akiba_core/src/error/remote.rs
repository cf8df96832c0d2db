//! Errors from HTTP based sources

use thiserror::Error;

/// Failure talking to an HTTP source such as the title corpus or a search provider
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Request to {service} failed: {message}")]
    Request { service: String, message: String },

    #[error("{service} answered with HTTP status {status}")]
    Status { service: String, status: u16 },

    #[error("Could not decode {service} response: {message}")]
    Decode { service: String, message: String },
}

impl RemoteError {
    pub fn request(service: &str, message: impl Into<String>) -> Self {
        Self::Request {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn status(service: &str, status: u16) -> Self {
        Self::Status {
            service: service.to_string(),
            status,
        }
    }

    pub fn decode(service: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            service: service.to_string(),
            message: message.into(),
        }
    }

    /// Convert a reqwest failure, keeping the status code when there is one
    pub fn from_reqwest(service: &str, error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => Self::status(service, status.as_u16()),
            None if error.is_decode() => Self::decode(service, error.to_string()),
            None => Self::request(service, error.to_string()),
        }
    }
}
