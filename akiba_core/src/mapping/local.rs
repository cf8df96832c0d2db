//! Operator curated id mapping store

use crate::Result;
use crate::anime::{AnimeId, Provider, SecondaryId};
use crate::cache::{CacheConfig, CacheStore, LOCAL_MAPPING_FILE, LoadState, PRIVATE_FILE_MODE, TableCache};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Season assumed for a TMDB series mapping
pub const DEFAULT_TMDB_SEASON: u32 = 1;

/// Secondary ids recorded for one primary id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anilist: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u64>,
    #[serde(
        rename = "tmdbSeason",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tmdb_season: Option<u32>,
}

impl LocalEntry {
    pub fn is_empty(&self) -> bool {
        self.anilist.is_none() && self.tmdb.is_none()
    }
}

/// Local mapping file, read at startup and rewritten whole on change
pub struct LocalMapping {
    table: TableCache<LocalEntry>,
}

impl LocalMapping {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            table: TableCache::new("local mapping", config.file(LOCAL_MAPPING_FILE), None)
                .with_mode(PRIVATE_FILE_MODE),
        }
    }

    /// Load the mapping file, returning whether one was found
    pub async fn refresh(&self) -> Result<bool> {
        Ok(self.table.load().await? != LoadState::Missing)
    }

    /// Copy mapped ids into `id`, only filling absent ids unless `overwrite`
    pub async fn apply(&self, id: &mut AnimeId, overwrite: bool) -> Result<()> {
        let Some(entry) = self.table.read(&id.primary().to_string()).await? else {
            return Ok(());
        };

        if let Some(anilist) = entry.anilist {
            id.fill(Provider::AniList, SecondaryId::new(anilist), overwrite);
        }
        if let Some(tmdb) = entry.tmdb {
            let secondary = SecondaryId {
                id: tmdb,
                season: entry.tmdb_season,
            };
            id.fill(Provider::Tmdb, secondary, overwrite);
        }
        Ok(())
    }

    pub async fn entry(&self, aid: u64) -> Option<LocalEntry> {
        self.table.get(&aid.to_string()).await
    }

    pub async fn entries(&self) -> BTreeMap<String, LocalEntry> {
        self.table.snapshot().await
    }

    /// Map or unmap the AniList id of an anime
    pub async fn set_anilist(&self, aid: u64, anilist: Option<u64>) -> Result<()> {
        self.update(aid, |entry| entry.anilist = anilist).await
    }

    /// Map or unmap the TMDB series of an anime, mapped series start at season 1
    pub async fn set_tmdb(&self, aid: u64, tmdb: Option<u64>) -> Result<()> {
        self.update(aid, |entry| {
            entry.tmdb = tmdb;
            entry.tmdb_season = tmdb.map(|_| DEFAULT_TMDB_SEASON);
        })
        .await
    }

    pub fn path(&self) -> &Path {
        self.table.path()
    }

    async fn update(&self, aid: u64, change: impl FnOnce(&mut LocalEntry)) -> Result<()> {
        let key = aid.to_string();
        let mut entry = self.table.get(&key).await.unwrap_or_default();
        change(&mut entry);

        if entry.is_empty() {
            debug!("Removing empty local mapping for {aid}");
            self.table.remove(&key).await;
            self.table.persist().await
        } else {
            self.table.write(&key, entry).await
        }
    }
}
