//! Streaming hasher abstraction shared by all supported algorithms

use super::algorithms::{Crc32Hasher, Ed2kHasher, Md5Hasher, Sha1Hasher};

/// Trait for streaming hash calculation
pub trait StreamingHasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash calculation and return the lowercase hex digest
    fn finalize(self: Box<Self>) -> String;
}

/// Hash algorithms computed over media files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// Two-level MD4 block hash used as the content fingerprint
    Ed2k,
    Crc32,
    Md5,
    Sha1,
}

impl HashAlgorithm {
    /// Create a fresh streaming hasher for this algorithm
    pub fn create_hasher(self) -> Box<dyn StreamingHasher> {
        match self {
            Self::Ed2k => Box::new(Ed2kHasher::new()),
            Self::Crc32 => Box::new(Crc32Hasher::new()),
            Self::Md5 => Box::new(Md5Hasher::new()),
            Self::Sha1 => Box::new(Sha1Hasher::new()),
        }
    }

    /// Hash an in-memory buffer
    pub fn hash_bytes(self, data: &[u8]) -> String {
        let mut hasher = self.create_hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ed2k => "ED2K",
            Self::Crc32 => "CRC32",
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
        };
        write!(f, "{name}")
    }
}
