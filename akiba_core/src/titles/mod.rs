//! Anime title index
//!
//! Holds the main and official titles of every anime and maps free text,
//! usually a directory name, back to a primary id.

mod source;

pub use source::{HttpTitleSource, TITLES_URL, TitleMap, TitleSource, gunzip, parse_corpus};

use crate::Result;
use crate::anime::{AnimeId, TitleVariant};
use crate::cache::{CacheConfig, LoadState, TITLES_FILE, TableCache, days};
use crate::matching::levenshtein;
use log::{debug, warn};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Maximum edit distance accepted for a fuzzy title match
pub const FUZZY_THRESHOLD: usize = 3;

static ID_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\[anidb-(\d+)\]").ok());

/// Characters that stand in for `/` in file and directory names
const SLASH_LOOKALIKES: [char; 3] = ['\u{2044}', '\u{2215}', '\u{FF0F}'];

/// Title lookups backed by the cached title corpus
pub struct TitleIndex<S: TitleSource = HttpTitleSource> {
    source: S,
    cache: TableCache<Vec<TitleVariant>>,
    titles: TitleMap,
}

impl<S: TitleSource> TitleIndex<S> {
    pub fn new(config: &CacheConfig, source: S) -> Self {
        Self {
            source,
            cache: TableCache::new(
                "titles",
                config.file(TITLES_FILE),
                Some(days(config.title_age)),
            ),
            titles: TitleMap::new(),
        }
    }

    /// Load the corpus from cache, downloading it again once the cache is stale
    ///
    /// There is no incremental update: a download replaces the whole table.
    pub async fn refresh(&mut self) -> Result<()> {
        if self.cache.load().await? == LoadState::Fresh {
            self.titles = decode_keys(self.cache.snapshot().await);
            debug!("Using {} cached anime titles", self.titles.len());
            return Ok(());
        }

        let titles = self.source.fetch().await?;
        self.cache
            .replace(
                titles
                    .iter()
                    .map(|(aid, variants)| (aid.to_string(), variants.clone()))
                    .collect(),
            )
            .await?;
        self.titles = titles;
        Ok(())
    }

    /// Every known title of an anime, in corpus order
    pub fn titles_of(&self, id: &AnimeId) -> &[TitleVariant] {
        self.titles
            .get(&id.primary())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolve free text to a primary id
    ///
    /// An explicit `[anidb-<id>]` tag wins outright. Otherwise an exact title
    /// match is taken, then the closest title within [`FUZZY_THRESHOLD`]
    /// edits. Equal distances keep the lowest primary id.
    pub fn resolve(&self, text: &str) -> Option<AnimeId> {
        if let Some(aid) = tagged_id(text) {
            return Some(AnimeId::new(aid));
        }

        let normalized = normalize(text);
        let mut best: Option<(u64, usize)> = None;

        for (aid, variants) in &self.titles {
            for variant in variants {
                if variant.title == normalized {
                    debug!("Exact title match for '{normalized}': {aid}");
                    return Some(AnimeId::new(*aid));
                }

                let distance = levenshtein(&normalized, &variant.title);
                if distance <= FUZZY_THRESHOLD && best.is_none_or(|(_, score)| distance < score) {
                    best = Some((*aid, distance));
                }
            }
        }

        if let Some((aid, distance)) = best {
            debug!("Fuzzy title match for '{normalized}': {aid} (distance {distance})");
        }
        best.map(|(aid, _)| AnimeId::new(aid))
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

fn tagged_id(text: &str) -> Option<u64> {
    ID_TAG
        .as_ref()?
        .captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

fn normalize(text: &str) -> String {
    text.replace(SLASH_LOOKALIKES, "/")
}

fn decode_keys(table: BTreeMap<String, Vec<TitleVariant>>) -> TitleMap {
    table
        .into_iter()
        .filter_map(|(key, variants)| match key.parse() {
            Ok(aid) => Some((aid, variants)),
            Err(_) => {
                warn!("Ignoring title cache entry with invalid id '{key}'");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anime::TitleKind;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FixedSource {
        titles: TitleMap,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TitleSource for FixedSource {
        async fn fetch(&self) -> Result<TitleMap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.titles.clone())
        }
    }

    fn corpus() -> TitleMap {
        let main = |t: &str| TitleVariant::new(t, TitleKind::Main, "x-jat");
        TitleMap::from([
            (1, vec![main("Seikai no Monshou")]),
            (23, vec![main("Cowboy Bebop")]),
            (40, vec![main("Fate/Zero")]),
            (50, vec![main("Cowboy Bebopp")]),
            (60, vec![main("Cowboy Bebox")]),
        ])
    }

    async fn index(dir: &TempDir) -> (TitleIndex<FixedSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FixedSource {
            titles: corpus(),
            calls: calls.clone(),
        };
        let mut index = TitleIndex::new(&CacheConfig::new(dir.path()), source);
        index.refresh().await.unwrap();
        (index, calls)
    }

    #[tokio::test]
    async fn test_tag_bypasses_fuzzy_search() {
        let dir = TempDir::new().unwrap();
        let (index, _) = index(&dir).await;

        let id = index.resolve("Cowboy Bebop [anidb-1234]").unwrap();
        assert_eq!(id.primary(), 1234);
    }

    #[tokio::test]
    async fn test_exact_match_wins() {
        let dir = TempDir::new().unwrap();
        let (index, _) = index(&dir).await;

        assert_eq!(index.resolve("Cowboy Bebop").unwrap().primary(), 23);
        assert_eq!(index.resolve("Fate\u{2044}Zero").unwrap().primary(), 40);
    }

    #[tokio::test]
    async fn test_fuzzy_match_threshold_and_tie_break() {
        let dir = TempDir::new().unwrap();
        let (index, _) = index(&dir).await;

        // one edit away from 23, 50 and 60
        assert_eq!(index.resolve("Cowboy Bebopx").unwrap().primary(), 23);
        assert_eq!(index.resolve("Cowboy Bebo").unwrap().primary(), 23);
        assert_eq!(index.resolve("Seikai no Monsho").unwrap().primary(), 1);
        assert!(index.resolve("Something Else Entirely").is_none());
    }

    #[tokio::test]
    async fn test_refresh_uses_fresh_cache() {
        let dir = TempDir::new().unwrap();
        let (first, calls) = index(&dir).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(dir.path().join(TITLES_FILE).exists());
        drop(first);

        let (second, calls) = index(&dir).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.len(), 5);
        assert_eq!(
            second.titles_of(&AnimeId::new(23))[0].title,
            "Cowboy Bebop"
        );
        assert!(second.titles_of(&AnimeId::new(999)).is_empty());
    }
}
