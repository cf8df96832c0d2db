//! TMDB series lookup by title search

use super::{BestMatch, search_candidates, threshold};
use crate::Result;
use crate::anime::{AnimeId, Provider, SecondaryId, TitleKind, TitleVariant};
use crate::error::RemoteError;
use crate::mapping::local::DEFAULT_TMDB_SEASON;
use crate::matching::levenshtein;
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
const SERVICE: &str = "tmdb";

/// TMDB genre id of animation
pub const GENRE_ANIMATION: u64 = 16;

const SEARCH_TITLES: &[(TitleKind, &str)] = &[
    (TitleKind::Official, "ja"),
    (TitleKind::Official, "en"),
    (TitleKind::Main, "x-jat"),
];

/// TV search hit
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TmdbShow {
    pub id: u64,
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub original_language: Option<String>,
    /// `YYYY-MM-DD`, empty for unaired shows
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
}

impl TmdbShow {
    fn is_japanese(&self) -> bool {
        self.original_language.as_deref() == Some("ja")
    }

    /// Year of the first air date
    pub fn year(&self) -> Option<i32> {
        self.first_air_date.as_deref()?.get(..4)?.parse().ok()
    }

    fn names(&self) -> impl Iterator<Item = String> + '_ {
        [self.name.as_deref(), self.original_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::to_lowercase)
    }
}

/// TMDB search backend
#[async_trait]
pub trait TmdbSearch: Send + Sync {
    async fn search_tv(&self, query: &str) -> Result<Vec<TmdbShow>>;
}

#[derive(Debug, Deserialize)]
struct TvSearchResults {
    #[serde(default)]
    results: Vec<TmdbShow>,
}

/// Client for the TMDB v3 API
pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl TmdbSearch for TmdbClient {
    async fn search_tv(&self, query: &str) -> Result<Vec<TmdbShow>> {
        let response: TvSearchResults = self
            .client
            .get(format!("{TMDB_API_BASE}/search/tv"))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("include_adult", "true"),
            ])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| RemoteError::from_reqwest(SERVICE, e))?
            .json()
            .await
            .map_err(|e| RemoteError::from_reqwest(SERVICE, e))?;

        Ok(response.results)
    }
}

/// Fills the TMDB series id of an anime from its titles
///
/// Only animation series are considered, compared by both `name` and
/// `original_name`. Candidates are queried in order until one matches
/// exactly. A Japanese title also matches exactly once rewritten to the
/// punctuation TMDB uses for Japanese names. A candidate derived from a
/// trailing `(YYYY)` only accepts shows first aired that year. Without an
/// exact match the closest name within the language's threshold is taken.
pub struct TmdbMapper {
    search: Box<dyn TmdbSearch>,
}

impl TmdbMapper {
    pub fn new(search: Box<dyn TmdbSearch>) -> Self {
        Self { search }
    }

    pub async fn apply(
        &self,
        id: &mut AnimeId,
        titles: &[TitleVariant],
        overwrite: bool,
    ) -> Result<()> {
        if id.has(Provider::Tmdb) && !overwrite {
            return Ok(());
        }

        let mut exact = None;
        let mut best = BestMatch::default();

        for candidate in search_candidates(titles, SEARCH_TITLES) {
            if exact.is_some() {
                break;
            }

            let threshold = threshold(&candidate);
            let wanted = candidate.title.to_lowercase();
            let japanese = candidate.language == "ja";
            let punctuated = japanese.then(|| japanese_punctuation(&wanted));

            for show in self.search.search_tv(&candidate.title).await? {
                if !show.genre_ids.contains(&GENRE_ANIMATION) {
                    continue;
                }
                if candidate.year.is_some() && show.year() != candidate.year {
                    continue;
                }

                let names: Vec<String> = show.names().collect();
                let Some(distance) = names.iter().map(|name| levenshtein(&wanted, name)).min()
                else {
                    continue;
                };

                let punctuation_match = show.is_japanese()
                    && punctuated
                        .as_ref()
                        .is_some_and(|punctuated| names.contains(punctuated));

                if candidate.year.is_none() && (distance == 0 || punctuation_match) {
                    exact = Some(show.id);
                    break;
                }
                best.offer(show.id, distance, threshold);
            }
        }

        if let Some(tmdb) = exact.or(best.id()) {
            debug!("TMDB id {tmdb} for anime {}", id.primary());
            id.fill(
                Provider::Tmdb,
                SecondaryId::with_season(tmdb, DEFAULT_TMDB_SEASON),
                overwrite,
            );
        }
        Ok(())
    }
}

/// Rewrite the first occurrence of each ASCII mark TMDB stores in Japanese form
fn japanese_punctuation(title: &str) -> String {
    let mut normalized = title
        .replacen('&', "and", 1)
        .replacen('[', "【", 1)
        .replacen(']', "】", 1)
        .replacen(',', "、", 1);
    if normalized.ends_with('.') {
        normalized.pop();
        normalized.push('。');
    }
    normalized
}
