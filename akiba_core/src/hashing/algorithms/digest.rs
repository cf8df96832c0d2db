//! Integrity checksums backed by the RustCrypto and crc32fast hashers

use crate::hashing::traits::StreamingHasher;
use md5::{Digest as Md5Digest, Md5};
use sha1::{Digest as Sha1Digest, Sha1};

/// CRC32 streaming hasher, rendered as eight hex digits
pub struct Crc32Hasher {
    hasher: crc32fast::Hasher,
}

impl Crc32Hasher {
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }
}

impl Default for Crc32Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingHasher for Crc32Hasher {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> String {
        format!("{:08x}", self.hasher.finalize())
    }
}

pub struct Md5Hasher {
    hasher: Md5,
}

impl Md5Hasher {
    pub fn new() -> Self {
        Self { hasher: Md5::new() }
    }
}

impl Default for Md5Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingHasher for Md5Hasher {
    fn update(&mut self, data: &[u8]) {
        Md5Digest::update(&mut self.hasher, data);
    }

    fn finalize(self: Box<Self>) -> String {
        format!("{:x}", Md5Digest::finalize(self.hasher))
    }
}

pub struct Sha1Hasher {
    hasher: Sha1,
}

impl Sha1Hasher {
    pub fn new() -> Self {
        Self {
            hasher: Sha1::new(),
        }
    }
}

impl Default for Sha1Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingHasher for Sha1Hasher {
    fn update(&mut self, data: &[u8]) {
        Sha1Digest::update(&mut self.hasher, data);
    }

    fn finalize(self: Box<Self>) -> String {
        format!("{:x}", Sha1Digest::finalize(self.hasher))
    }
}
