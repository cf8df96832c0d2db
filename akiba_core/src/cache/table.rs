//! Single-file TOML table cache

use super::{CacheStore, FILE_MODE, is_fresh, write_file};
use crate::Result;
use crate::error::{InternalError, io};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;

/// Outcome of loading a table from disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// File parsed and within its age limit
    Fresh,
    /// File parsed but older than its age limit; entries are still loaded
    Stale,
    /// File absent or unparseable; the table is empty
    Missing,
}

/// Key to value table persisted as a single TOML file
///
/// Entries live in memory after [`TableCache::load`]; every mutation through
/// [`CacheStore`] writes the whole table back.
pub struct TableCache<V> {
    name: &'static str,
    file: PathBuf,
    max_age: Option<Duration>,
    mode: u32,
    entries: RwLock<BTreeMap<String, V>>,
}

impl<V> TableCache<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Create an empty table bound to `file`
    ///
    /// With `max_age` set the table is [`LoadState::Stale`] once the file's
    /// modification time is older than the limit.
    pub fn new(name: &'static str, file: impl Into<PathBuf>, max_age: Option<Duration>) -> Self {
        Self {
            name,
            file: file.into(),
            max_age,
            mode: FILE_MODE,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Use a different permission mode for the backing file
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Load the table from disk, replacing the in-memory entries
    pub async fn load(&self) -> Result<LoadState> {
        let contents = match tokio::fs::read_to_string(&self.file).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} cache not found at {}", self.name, self.file.display());
                self.entries.write().await.clear();
                return Ok(LoadState::Missing);
            }
            Err(e) => return Err(io::at(&self.file)(e).into()),
        };

        let parsed = match toml::from_str::<BTreeMap<String, V>>(&contents) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    "Ignoring unreadable {} cache {}: {e}",
                    self.name,
                    self.file.display()
                );
                self.entries.write().await.clear();
                return Ok(LoadState::Missing);
            }
        };

        debug!("Loaded {} {} cache entries", parsed.len(), self.name);
        *self.entries.write().await = parsed;

        let fresh = match self.max_age {
            Some(max_age) => is_fresh(&self.file, max_age).await,
            None => true,
        };
        Ok(if fresh {
            LoadState::Fresh
        } else {
            LoadState::Stale
        })
    }

    /// Replace every entry at once and persist
    pub async fn replace(&self, entries: BTreeMap<String, V>) -> Result<()> {
        *self.entries.write().await = entries;
        self.persist().await
    }

    /// Write the in-memory table to disk
    pub async fn persist(&self) -> Result<()> {
        let contents = {
            let entries = self.entries.read().await;
            toml::to_string(&*entries)
                .map_err(|e| InternalError::cache_serialization(self.name, e.to_string()))?
        };
        write_file(&self.file, &contents, self.mode).await
    }

    /// Update an entry in memory only
    pub async fn insert(&self, key: &str, value: V) {
        self.entries.write().await.insert(key.to_string(), value);
    }

    /// Remove an entry in memory only
    pub async fn remove(&self, key: &str) -> Option<V> {
        self.entries.write().await.remove(key)
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn snapshot(&self) -> BTreeMap<String, V> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl<V> CacheStore<V> for TableCache<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    async fn read(&self, key: &str) -> Result<Option<V>> {
        Ok(self.get(key).await)
    }

    async fn write(&self, key: &str, value: V) -> Result<()> {
        self.insert(key, value).await;
        self.persist().await
    }

    async fn purge_stale(
        &self,
        predicate: &(dyn for<'k, 'v> Fn(&'k str, &'v V) -> bool + Send + Sync),
    ) -> Result<usize> {
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|key, value| !predicate(key, value));
            before - entries.len()
        };

        if removed > 0 {
            debug!("Purged {removed} stale {} cache entries", self.name);
            self.persist().await?;
        }
        Ok(removed)
    }
}
