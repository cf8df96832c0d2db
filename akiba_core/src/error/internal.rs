//! Internal library errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InternalError {
    #[error("Hash calculation failed for algorithm '{algorithm}': {message}")]
    HashCalculation { algorithm: String, message: String },

    /// A cache table could not be serialized for writing
    #[error("Cache serialization failed for '{cache}': {message}")]
    CacheSerialization { cache: String, message: String },
}

impl InternalError {
    pub fn hash_calculation(algorithm: &str, message: &str) -> Self {
        Self::HashCalculation {
            algorithm: algorithm.to_string(),
            message: message.to_string(),
        }
    }

    pub fn cache_serialization(cache: &str, message: impl Into<String>) -> Self {
        Self::CacheSerialization {
            cache: cache.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_calculation_error() {
        let error = InternalError::hash_calculation("ED2K", "Chunk processing failed");
        assert!(error.to_string().contains("Hash calculation failed"));
        assert!(error.to_string().contains("ED2K"));
    }

    #[test]
    fn test_cache_serialization_error() {
        let error = InternalError::cache_serialization("hashes", "unsupported value");
        assert!(error.to_string().contains("hashes"));
        assert!(error.to_string().contains("unsupported value"));
    }
}
