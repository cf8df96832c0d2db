//! Content fingerprinting for media files
//!
//! A file is read once in fixed-size slices and every requested algorithm is
//! fed from the same buffer. The ED2K digest plus the byte size form the
//! [`ContentFingerprint`] that keys remote lookups.

use crate::Result;
use crate::error::{IoError, io};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncReadExt;

mod algorithms;
mod traits;

pub use algorithms::ed2k::BLOCK_SIZE as ED2K_BLOCK_SIZE;
pub use traits::{HashAlgorithm, StreamingHasher};

/// Read size used when streaming files through the hashers
const READ_BUFFER_SIZE: usize = 1024 * 1024;

const MILLIS_PER_DAY: f64 = 1000.0 * 3600.0 * 24.0;

/// Content fingerprint of a media file
///
/// Stored in the per-machine hash cache keyed by absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFingerprint {
    /// ED2K digest as lowercase hex
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// `ed2k://` link built from the file's basename
    pub link: String,
    /// Creation time in milliseconds since the Unix epoch
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl ContentFingerprint {
    pub fn new(path: &Path, hash: String, size: u64) -> Self {
        Self {
            link: ed2k_link(path, size, &hash),
            hash,
            size,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Regenerate the link after the file was relocated
    pub fn relink(&mut self, path: &Path) {
        self.link = ed2k_link(path, self.size, &self.hash);
    }

    /// Age of the fingerprint in (fractional) days relative to `now_ms`
    pub fn age_days(&self, now_ms: i64) -> f64 {
        (now_ms - self.created_at) as f64 / MILLIS_PER_DAY
    }
}

/// Integrity checksums computed locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksums {
    pub crc32: String,
    pub md5: String,
    pub sha1: String,
}

/// Build the `ed2k://|file|<name>|<size>|<hash>|/` link for a path
pub fn ed2k_link(path: &Path, size: u64, hash: &str) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    format!("ed2k://|file|{name}|{size}|{hash}|/")
}

/// Fingerprint a file
///
/// Fails with an I/O error when the path is missing or is not a regular file.
pub async fn fingerprint(path: &Path) -> Result<ContentFingerprint> {
    let (size, mut digests) = hash_file(path, &[HashAlgorithm::Ed2k]).await?;
    Ok(ContentFingerprint::new(path, digests.remove(0), size))
}

/// Fingerprint a file and compute its integrity checksums in the same pass
pub async fn fingerprint_with_checksums(path: &Path) -> Result<(ContentFingerprint, Checksums)> {
    let algorithms = [
        HashAlgorithm::Ed2k,
        HashAlgorithm::Crc32,
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
    ];
    let (size, digests) = hash_file(path, &algorithms).await?;
    let [ed2k, crc32, md5, sha1]: [String; 4] = digests
        .try_into()
        .map_err(|_| crate::error::InternalError::hash_calculation("ED2K", "digest count"))?;

    Ok((
        ContentFingerprint::new(path, ed2k, size),
        Checksums { crc32, md5, sha1 },
    ))
}

/// Compute only the integrity checksums of a file
pub async fn checksums(path: &Path) -> Result<Checksums> {
    let algorithms = [HashAlgorithm::Crc32, HashAlgorithm::Md5, HashAlgorithm::Sha1];
    let (_, digests) = hash_file(path, &algorithms).await?;
    let [crc32, md5, sha1]: [String; 3] = digests
        .try_into()
        .map_err(|_| crate::error::InternalError::hash_calculation("CRC32", "digest count"))?;

    Ok(Checksums { crc32, md5, sha1 })
}

/// Check that `path` names an existing regular file and return its size
pub async fn regular_file_size(path: &Path) -> Result<u64> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IoError::file_not_found(path).into());
        }
        Err(e) => return Err(io::at(path)(e).into()),
    };

    if !metadata.is_file() {
        return Err(IoError::not_a_file(path).into());
    }

    Ok(metadata.len())
}

/// Stream a file through the requested hashers, returning size and digests
/// in the order the algorithms were given.
async fn hash_file(path: &Path, algorithms: &[HashAlgorithm]) -> Result<(u64, Vec<String>)> {
    regular_file_size(path).await?;

    let mut file = tokio::fs::File::open(path).await.map_err(io::at(path))?;
    let mut hashers: Vec<Box<dyn StreamingHasher>> =
        algorithms.iter().map(|a| a.create_hasher()).collect();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut total: u64 = 0;

    loop {
        let read = file.read(&mut buffer).await.map_err(io::at(path))?;
        if read == 0 {
            break;
        }
        for hasher in hashers.iter_mut() {
            hasher.update(&buffer[..read]);
        }
        total += read as u64;
    }

    log::debug!("Hashed {} ({total} bytes)", path.display());

    Ok((total, hashers.into_iter().map(|h| h.finalize()).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::error::IoErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fingerprint_small_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Show - 01 - Pilot.mkv");
        std::fs::write(&path, b"a").unwrap();

        let fp = fingerprint(&path).await.unwrap();
        assert_eq!(fp.hash, "bde52cb31de33e46245e05fbdbd6fb24");
        assert_eq!(fp.size, 1);
        assert_eq!(
            fp.link,
            "ed2k://|file|Show - 01 - Pilot.mkv|1|bde52cb31de33e46245e05fbdbd6fb24|/"
        );
        assert!(fp.created_at > 0);
    }

    #[tokio::test]
    async fn test_identical_content_identical_digest() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.mkv");
        let second = dir.path().join("nested-second.mkv");
        std::fs::write(&first, vec![7u8; 300_000]).unwrap();
        std::fs::write(&second, vec![7u8; 300_000]).unwrap();

        let a = fingerprint(&first).await.unwrap();
        let b = fingerprint(&second).await.unwrap();
        let again = fingerprint(&first).await.unwrap();

        assert_eq!(a.hash, b.hash);
        assert_eq!(a.hash, again.hash);
        assert_ne!(a.link, b.link);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.mkv");
        std::fs::write(&path, b"").unwrap();

        let fp = fingerprint(&path).await.unwrap();
        assert_eq!(fp.hash, "31d6cfe0d16ae931b73c59d7e0c089c0");
        assert_eq!(fp.size, 0);
    }

    #[tokio::test]
    async fn test_checksums_single_pass_matches_separate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.mkv");
        std::fs::write(&path, b"abc").unwrap();

        let (fp, sums) = fingerprint_with_checksums(&path).await.unwrap();
        assert_eq!(fp.hash, fingerprint(&path).await.unwrap().hash);
        assert_eq!(sums, checksums(&path).await.unwrap());
        assert_eq!(sums.md5, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(sums.sha1, "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(sums.crc32, "352441c2");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = fingerprint(Path::new("/definitely/not/here.mkv")).await;
        match result {
            Err(Error::Io(e)) => assert_eq!(e.kind, IoErrorKind::FileNotFound),
            other => panic!("Expected FileNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        match fingerprint(dir.path()).await {
            Err(Error::Io(e)) => assert_eq!(e.kind, IoErrorKind::NotAFile),
            other => panic!("Expected NotAFile, got {other:?}"),
        }
    }

    #[test]
    fn test_relink_uses_new_basename() {
        let mut fp = ContentFingerprint::new(Path::new("/a/old.mkv"), "abcd".to_string(), 4);
        fp.relink(Path::new("/b/Show - 1 - New.mkv"));
        assert_eq!(fp.link, "ed2k://|file|Show - 1 - New.mkv|4|abcd|/");
    }

    #[test]
    fn test_age_days() {
        let fp = ContentFingerprint {
            hash: String::new(),
            size: 0,
            link: String::new(),
            created_at: 0,
        };
        assert!((fp.age_days(86_400_000 * 3) - 3.0).abs() < f64::EPSILON);
    }
}
