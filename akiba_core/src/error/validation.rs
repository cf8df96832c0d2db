//! Rejected caller input

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    /// Two options that cannot be honoured together
    #[error("'{first}' cannot be combined with '{second}'")]
    Conflict { first: String, second: String },
}

impl ValidationError {
    pub fn conflict(first: &str, second: &str) -> Self {
        Self::Conflict {
            first: first.to_string(),
            second: second.to_string(),
        }
    }
}
