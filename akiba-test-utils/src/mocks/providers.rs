//! In-memory title, mapping and search backends

use akiba_core::Result;
use akiba_core::anime::{TitleKind, TitleVariant};
use akiba_core::mapping::{
    AniListMedia, AniListSearch, AniListTitle, ListEntry, MappingFeed, TmdbSearch, TmdbShow,
};
use akiba_core::titles::{TitleMap, TitleSource};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Title corpus served from memory, counting downloads
#[derive(Debug, Clone, Default)]
pub struct StaticTitleSource {
    titles: TitleMap,
    fetches: Arc<AtomicUsize>,
}

impl StaticTitleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anime with its main x-jat title and official titles
    pub fn anime(mut self, aid: u64, main: &str, official: &[(&str, &str)]) -> Self {
        let mut variants = vec![TitleVariant::new(main, TitleKind::Main, "x-jat")];
        variants.extend(
            official
                .iter()
                .map(|(language, title)| TitleVariant::new(*title, TitleKind::Official, *language)),
        );
        self.titles.insert(aid, variants);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TitleSource for StaticTitleSource {
    async fn fetch(&self) -> Result<TitleMap> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.titles.clone())
    }
}

/// Crosswalk feed served from memory
#[derive(Debug, Clone, Default)]
pub struct StaticMappingFeed {
    entries: BTreeMap<u64, ListEntry>,
    fetches: Arc<AtomicUsize>,
}

impl StaticMappingFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anilist(mut self, aid: u64, anilist: u64) -> Self {
        self.entries.insert(
            aid,
            ListEntry {
                anilist: Some(anilist),
            },
        );
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MappingFeed for StaticMappingFeed {
    async fn fetch(&self) -> Result<BTreeMap<u64, ListEntry>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.clone())
    }
}

/// AniList search returning fixed media for every query
#[derive(Debug, Clone, Default)]
pub struct ScriptedAniList {
    media: Vec<AniListMedia>,
    searches: Arc<AtomicUsize>,
}

impl ScriptedAniList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn media(mut self, id: u64, romaji: &str, season_year: Option<i32>) -> Self {
        self.media.push(AniListMedia {
            id,
            title: AniListTitle {
                romaji: Some(romaji.to_string()),
                ..AniListTitle::default()
            },
            season_year,
        });
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AniListSearch for ScriptedAniList {
    async fn search(&self, _title: &str) -> Result<Vec<AniListMedia>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.media.clone())
    }
}

/// TMDB search returning fixed shows for every query
#[derive(Debug, Clone, Default)]
pub struct ScriptedTmdb {
    shows: Vec<TmdbShow>,
    searches: Arc<AtomicUsize>,
}

impl ScriptedTmdb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a Japanese animation series
    pub fn anime(mut self, id: u64, name: &str, original_name: &str) -> Self {
        self.shows.push(TmdbShow {
            id,
            name: Some(name.to_string()),
            original_name: Some(original_name.to_string()),
            original_language: Some("ja".to_string()),
            first_air_date: None,
            genre_ids: vec![akiba_core::mapping::tmdb::GENRE_ANIMATION],
        });
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TmdbSearch for ScriptedTmdb {
    async fn search_tv(&self, _query: &str) -> Result<Vec<TmdbShow>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.shows.clone())
    }
}
