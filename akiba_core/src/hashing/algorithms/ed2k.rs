//! ED2K hash algorithm implementation
//!
//! The input is split into blocks of 9,728,000 bytes and each block is hashed
//! with MD4. A single block yields its own digest; more than one block yields
//! the MD4 of the concatenated raw block digests. An empty input hashes to
//! MD4 of nothing. No extra empty block is appended when the size is an exact
//! multiple of the block size.

use super::to_hex;
use crate::hashing::traits::StreamingHasher;
use md4::{Digest, Md4};

/// ED2K block size in bytes
pub const BLOCK_SIZE: usize = 9_728_000;

/// ED2K streaming hasher
///
/// Feeds MD4 directly instead of buffering whole blocks, so memory use stays
/// constant regardless of how the caller slices its reads.
pub struct Ed2kHasher {
    block: Md4,
    block_len: usize,
    block_digests: Vec<u8>,
    blocks: usize,
}

impl Ed2kHasher {
    pub fn new() -> Self {
        Self {
            block: Md4::new(),
            block_len: 0,
            block_digests: Vec::new(),
            blocks: 0,
        }
    }

    fn finish_block(&mut self) {
        let block = std::mem::replace(&mut self.block, Md4::new());
        self.block_digests.extend_from_slice(&block.finalize());
        self.block_len = 0;
        self.blocks += 1;
    }
}

impl Default for Ed2kHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingHasher for Ed2kHasher {
    fn update(&mut self, data: &[u8]) {
        let mut remaining = data;

        while !remaining.is_empty() {
            let take = remaining.len().min(BLOCK_SIZE - self.block_len);
            self.block.update(&remaining[..take]);
            self.block_len += take;
            remaining = &remaining[take..];

            if self.block_len == BLOCK_SIZE {
                self.finish_block();
            }
        }
    }

    fn finalize(mut self: Box<Self>) -> String {
        if self.block_len > 0 {
            self.finish_block();
        }

        match self.blocks {
            0 => format!("{:x}", Md4::new().finalize()),
            1 => to_hex(&self.block_digests),
            _ => format!("{:x}", Md4::digest(&self.block_digests)),
        }
    }
}
