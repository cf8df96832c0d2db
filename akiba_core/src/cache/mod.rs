//! Tiered on-disk caches
//!
//! Two backing shapes share the [`CacheStore`] contract:
//! - [`TableCache`]: one TOML file holding a key to value table, with
//!   freshness decided by the file's modification time
//! - [`RecordCache`]: one TOML file per key inside a directory, each file
//!   aged individually by its own modification time
//!
//! Unparseable cache files are never an error: they are logged and treated
//! as empty. Nothing here locks across processes, last writer wins.

mod fs;
mod hashes;
mod record;
mod table;

pub use fs::{ensure_dir, machine_id, write_file, DIR_MODE, FILE_MODE, PRIVATE_FILE_MODE};
pub use hashes::HashCache;
pub use record::RecordCache;
pub use table::{LoadState, TableCache};

use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the anime title corpus cache
pub const TITLES_FILE: &str = "titles.map.toml";
/// File name of the community list-mapping cache
pub const LIST_MAPPING_FILE: &str = "list.map.toml";
/// File name of the operator curated mapping store
pub const LOCAL_MAPPING_FILE: &str = "local.map.toml";
/// Directory holding per-fingerprint metadata records
pub const METADATA_DIR: &str = "anidb";
/// Extension of per-fingerprint metadata records
pub const METADATA_SUFFIX: &str = "fid.toml";

/// Default age limits, in days
pub const DEFAULT_METADATA_AGE: u32 = 90;
pub const DEFAULT_MAPPING_AGE: u32 = 7;
pub const DEFAULT_HASH_AGE: u32 = 30;
pub const DEFAULT_TITLE_AGE: u32 = 7;

/// Location and age limits of every cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub path: PathBuf,
    /// Max age of per-fingerprint metadata records, in days
    pub metadata_age: u32,
    /// Max age of the community list-mapping feed, in days
    pub mapping_age: u32,
    /// Max age of a fingerprint inside the hash cache, in days
    pub hash_age: u32,
    /// Max age of the title corpus, in days
    pub title_age: u32,
}

impl CacheConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metadata_age: DEFAULT_METADATA_AGE,
            mapping_age: DEFAULT_MAPPING_AGE,
            hash_age: DEFAULT_HASH_AGE,
            title_age: DEFAULT_TITLE_AGE,
        }
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.path.join(METADATA_DIR)
    }

    /// Per-machine hash cache file, named after the machine id
    pub fn hash_file(&self) -> PathBuf {
        self.path.join(format!("{}.hashes.toml", machine_id()))
    }
}

/// Convert an age in days into a duration
pub fn days(days: u32) -> Duration {
    Duration::from_secs(u64::from(days) * 24 * 3600)
}

/// Whether the file at `path` was modified less than `max_age` ago.
///
/// Missing files and unreadable timestamps count as stale.
pub async fn is_fresh(path: &Path, max_age: Duration) -> bool {
    let Ok(metadata) = tokio::fs::metadata(path).await else {
        return false;
    };
    match metadata.modified().map(|modified| modified.elapsed()) {
        Ok(Ok(age)) => age < max_age,
        // modification time in the future
        Ok(Err(_)) => true,
        Err(_) => false,
    }
}

/// Key to value cache contract shared by every cache tier
#[async_trait]
pub trait CacheStore<V>: Send + Sync {
    /// Read a value, `None` when absent
    ///
    /// Freshness is judged at the granularity of the backing file. A
    /// [`RecordCache`] holds one file per key and answers `None` for a stale
    /// record. A [`TableCache`] reports its age once through
    /// [`LoadState`] on load and keeps serving the loaded entries, leaving the
    /// refresh decision to its owner.
    async fn read(&self, key: &str) -> Result<Option<V>>;

    /// Write a value, replacing any previous value for the key
    async fn write(&self, key: &str, value: V) -> Result<()>;

    /// Drop every entry matching `predicate`, returning how many were removed
    async fn purge_stale(
        &self,
        predicate: &(dyn for<'k, 'v> Fn(&'k str, &'v V) -> bool + Send + Sync),
    ) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_config_paths() {
        let config = CacheConfig::new("/var/cache/akiba");
        assert_eq!(config.file(TITLES_FILE), PathBuf::from("/var/cache/akiba/titles.map.toml"));
        assert_eq!(config.metadata_dir(), PathBuf::from("/var/cache/akiba/anidb"));
        assert!(
            config
                .hash_file()
                .to_string_lossy()
                .ends_with(".hashes.toml")
        );
        assert_eq!(config.metadata_age, 90);
        assert_eq!(config.mapping_age, 7);
        assert_eq!(config.hash_age, 30);
    }

    #[tokio::test]
    async fn test_is_fresh() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.toml");
        assert!(!is_fresh(&file, days(1)).await);

        std::fs::write(&file, "").unwrap();
        assert!(is_fresh(&file, days(1)).await);
        assert!(!is_fresh(&file, Duration::ZERO).await);
    }
}
