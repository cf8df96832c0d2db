//! Community id crosswalk feed

use crate::Result;
use crate::anime::{AnimeId, Provider, SecondaryId};
use crate::cache::{CacheConfig, CacheStore, LIST_MAPPING_FILE, LoadState, TableCache, days};
use crate::error::RemoteError;
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mini variant of the Fribb anime-lists crosswalk
pub const LIST_MAPPING_URL: &str =
    "https://raw.githubusercontent.com/Fribb/anime-lists/refs/heads/master/anime-list-mini.json";

const SERVICE: &str = "anime-lists";

/// One crosswalk record, only the ids that are kept locally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anilist: Option<u64>,
}

/// Raw feed record
///
/// The feed carries many more catalogues; the TMDB id is not kept because the
/// feed has no season information.
#[derive(Debug, Deserialize)]
struct FeedRecord {
    #[serde(default)]
    anidb_id: Option<u64>,
    #[serde(default)]
    anilist_id: Option<u64>,
}

/// Where the crosswalk comes from
#[async_trait]
pub trait MappingFeed: Send + Sync {
    /// Fetch `primary id -> entry` pairs
    async fn fetch(&self) -> Result<BTreeMap<u64, ListEntry>>;
}

/// Downloads the crosswalk JSON array over HTTPS
pub struct HttpMappingFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpMappingFeed {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: LIST_MAPPING_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl MappingFeed for HttpMappingFeed {
    async fn fetch(&self) -> Result<BTreeMap<u64, ListEntry>> {
        info!("Downloading id mapping list from {}", self.url);

        let records: Vec<FeedRecord> = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| RemoteError::from_reqwest(SERVICE, e))?
            .json()
            .await
            .map_err(|e| RemoteError::from_reqwest(SERVICE, e))?;

        Ok(crosswalk(records))
    }
}

fn crosswalk(records: Vec<FeedRecord>) -> BTreeMap<u64, ListEntry> {
    records
        .into_iter()
        .filter_map(|record| {
            let aid = record.anidb_id?;
            let anilist = record.anilist_id.filter(|id| *id > 0)?;
            Some((
                aid,
                ListEntry {
                    anilist: Some(anilist),
                },
            ))
        })
        .collect()
}

/// Crosswalk cache, refreshed from the feed once older than the mapping age
pub struct ListMapping {
    feed: Box<dyn MappingFeed>,
    table: TableCache<ListEntry>,
}

impl ListMapping {
    pub fn new(config: &CacheConfig, feed: Box<dyn MappingFeed>) -> Self {
        Self {
            feed,
            table: TableCache::new(
                "list mapping",
                config.file(LIST_MAPPING_FILE),
                Some(days(config.mapping_age)),
            ),
        }
    }

    /// Load the cached crosswalk, downloading it again once stale
    pub async fn refresh(&self) -> Result<()> {
        if self.table.load().await? == LoadState::Fresh {
            debug!("Using {} cached list mappings", self.table.len().await);
            return Ok(());
        }

        let entries = self.feed.fetch().await?;
        self.table
            .replace(
                entries
                    .into_iter()
                    .map(|(aid, entry)| (aid.to_string(), entry))
                    .collect(),
            )
            .await
    }

    /// Fill the AniList id from the crosswalk
    pub async fn apply(&self, id: &mut AnimeId, overwrite: bool) -> Result<()> {
        let entry = self.table.read(&id.primary().to_string()).await?;
        if let Some(anilist) = entry.and_then(|entry| entry.anilist) {
            id.fill(Provider::AniList, SecondaryId::new(anilist), overwrite);
        }
        Ok(())
    }
}
