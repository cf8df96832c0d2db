//! Per-machine cache of content fingerprints keyed by absolute path

use super::{CacheConfig, CacheStore, TableCache};
use crate::Result;
use crate::hashing::ContentFingerprint;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fingerprint cache
///
/// The file itself never goes stale; instead individual entries are purged on
/// open when their path no longer exists or their fingerprint is older than
/// the configured hash age.
pub struct HashCache {
    table: TableCache<ContentFingerprint>,
    max_age_days: f64,
}

impl HashCache {
    /// Open the cache for this machine and purge dead entries
    pub async fn open(config: &CacheConfig) -> Result<Self> {
        Self::open_at(config.hash_file(), config.hash_age).await
    }

    /// Open a cache at an explicit location
    pub async fn open_at(file: PathBuf, hash_age: u32) -> Result<Self> {
        let cache = Self {
            table: TableCache::new("hashes", file, None),
            max_age_days: f64::from(hash_age),
        };
        cache.table.load().await?;

        let now = chrono::Utc::now().timestamp_millis();
        let max_age_days = cache.max_age_days;
        let removed = cache
            .table
            .purge_stale(&|path, fingerprint: &ContentFingerprint| {
                !Path::new(path).exists() || fingerprint.age_days(now) > max_age_days
            })
            .await?;
        if removed > 0 {
            debug!("Dropped {removed} dead fingerprints");
        }

        Ok(cache)
    }

    pub async fn get(&self, path: &Path) -> Option<ContentFingerprint> {
        self.table.get(&key(path)).await
    }

    /// Store a fingerprint and persist the cache
    pub async fn put(&self, path: &Path, fingerprint: ContentFingerprint) -> Result<()> {
        self.table.write(&key(path), fingerprint).await
    }

    /// Move an entry to a new path after a relocation
    ///
    /// The link is regenerated for the new basename. With `keep_source` the
    /// old entry survives, which is what a copy needs.
    pub async fn rekey(&self, from: &Path, to: &Path, keep_source: bool) -> Result<()> {
        let source = key(from);
        let entry = if keep_source {
            self.table.get(&source).await
        } else {
            self.table.remove(&source).await
        };

        if let Some(mut fingerprint) = entry {
            fingerprint.relink(to);
            self.table.insert(&key(to), fingerprint).await;
        }
        self.table.persist().await
    }

    pub async fn entries(&self) -> BTreeMap<String, ContentFingerprint> {
        self.table.snapshot().await
    }

    pub fn path(&self) -> &Path {
        self.table.path()
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fingerprint(path: &Path) -> ContentFingerprint {
        ContentFingerprint::new(path, "31d6cfe0d16ae931b73c59d7e0c089c0".into(), 0)
    }

    #[tokio::test]
    async fn test_put_and_reopen() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("a.mkv");
        std::fs::write(&media, b"").unwrap();
        let file = dir.path().join("m.hashes.toml");

        let cache = HashCache::open_at(file.clone(), 30).await.unwrap();
        let stored = fingerprint(&media);
        cache.put(&media, stored.clone()).await.unwrap();

        let reopened = HashCache::open_at(file, 30).await.unwrap();
        assert_eq!(reopened.get(&media).await, Some(stored));
    }

    #[tokio::test]
    async fn test_open_purges_missing_paths() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("m.hashes.toml");
        let gone = dir.path().join("gone.mkv");

        let cache = HashCache::open_at(file.clone(), 30).await.unwrap();
        cache.put(&gone, fingerprint(&gone)).await.unwrap();

        let reopened = HashCache::open_at(file, 30).await.unwrap();
        assert!(reopened.get(&gone).await.is_none());
    }

    #[tokio::test]
    async fn test_open_purges_old_fingerprints() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("a.mkv");
        std::fs::write(&media, b"").unwrap();
        let file = dir.path().join("m.hashes.toml");

        let cache = HashCache::open_at(file.clone(), 30).await.unwrap();
        let mut old = fingerprint(&media);
        old.created_at -= 31 * 24 * 3600 * 1000;
        cache.put(&media, old).await.unwrap();

        let reopened = HashCache::open_at(file, 30).await.unwrap();
        assert!(reopened.get(&media).await.is_none());
    }

    #[tokio::test]
    async fn test_rekey_moves_or_copies() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.mkv");
        let to = dir.path().join("Show").join("b.mkv");
        let cache = HashCache::open_at(dir.path().join("m.hashes.toml"), 30)
            .await
            .unwrap();

        cache.put(&from, fingerprint(&from)).await.unwrap();
        cache.rekey(&from, &to, true).await.unwrap();
        assert!(cache.get(&from).await.is_some());
        let moved = cache.get(&to).await.unwrap();
        assert!(moved.link.contains("|b.mkv|"));

        cache.rekey(&to, &from, false).await.unwrap();
        assert!(cache.get(&to).await.is_none());
        assert!(cache.get(&from).await.unwrap().link.contains("|a.mkv|"));
    }
}
