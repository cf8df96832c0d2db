//! Directory-backed cache with one TOML file per key

use super::{CacheStore, FILE_MODE, is_fresh, write_file};
use crate::Result;
use crate::error::{InternalError, io};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cache storing each value in `<dir>/<key>.<suffix>`
///
/// Each record ages on its own modification time; a stale record reads as
/// absent.
pub struct RecordCache<V> {
    name: &'static str,
    dir: PathBuf,
    suffix: &'static str,
    max_age: Duration,
    _value: PhantomData<fn() -> V>,
}

impl<V> RecordCache<V>
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(
        name: &'static str,
        dir: impl Into<PathBuf>,
        suffix: &'static str,
        max_age: Duration,
    ) -> Self {
        Self {
            name,
            dir: dir.into(),
            suffix,
            max_age,
            _value: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `key`
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{}", self.suffix))
    }

    async fn read_record(&self, path: &Path) -> Result<Option<V>> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io::at(path)(e).into()),
        };

        match toml::from_str(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable {} record {}: {e}", self.name, path.display());
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl<V> CacheStore<V> for RecordCache<V>
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    async fn read(&self, key: &str) -> Result<Option<V>> {
        let path = self.record_path(key);
        if !is_fresh(&path, self.max_age).await {
            debug!("No fresh {} record for {key}", self.name);
            return Ok(None);
        }
        self.read_record(&path).await
    }

    async fn write(&self, key: &str, value: V) -> Result<()> {
        let contents = toml::to_string(&value)
            .map_err(|e| InternalError::cache_serialization(self.name, e.to_string()))?;
        write_file(&self.record_path(key), &contents, FILE_MODE).await
    }

    async fn purge_stale(
        &self,
        predicate: &(dyn for<'k, 'v> Fn(&'k str, &'v V) -> bool + Send + Sync),
    ) -> Result<usize> {
        let mut reader = match tokio::fs::read_dir(&self.dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io::at(&self.dir)(e).into()),
        };

        let suffix = format!(".{}", self.suffix);
        let mut removed = 0;
        while let Some(entry) = reader.next_entry().await.map_err(io::at(&self.dir))? {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(key) = file_name.strip_suffix(&suffix) else {
                continue;
            };

            let expired = !is_fresh(&path, self.max_age).await;
            let matches = match self.read_record(&path).await? {
                Some(value) => predicate(key, &value),
                None => true,
            };
            if expired || matches {
                tokio::fs::remove_file(&path).await.map_err(io::at(&path))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
