//! Hash algorithm implementations

mod digest;
pub mod ed2k;

pub use digest::{Crc32Hasher, Md5Hasher, Sha1Hasher};
pub use ed2k::Ed2kHasher;

/// Lowercase hex encoding of a raw digest
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
