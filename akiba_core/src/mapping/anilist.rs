//! AniList id lookup by title search

use super::{BestMatch, search_candidates, threshold};
use crate::Result;
use crate::anime::{AnimeId, Provider, SecondaryId, TitleKind, TitleVariant};
use crate::error::RemoteError;
use crate::matching::levenshtein;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

const ANILIST_API_URL: &str = "https://graphql.anilist.co";
const SERVICE: &str = "anilist";

/// Official Japanese and main romanized titles
const SEARCH_TITLES: &[(TitleKind, &str)] =
    &[(TitleKind::Official, "ja"), (TitleKind::Main, "x-jat")];

const SEARCH_QUERY: &str = r#"
    query ($search: String) {
        Page(page: 1, perPage: 10) {
            media(search: $search, type: ANIME, sort: SEARCH_MATCH) {
                id
                title {
                    romaji
                    english
                    native
                }
                seasonYear
            }
        }
    }
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AniListTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

/// Search hit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AniListMedia {
    pub id: u64,
    #[serde(default)]
    pub title: AniListTitle,
    #[serde(rename = "seasonYear")]
    pub season_year: Option<i32>,
}

/// AniList search backend
#[async_trait]
pub trait AniListSearch: Send + Sync {
    async fn search(&self, title: &str) -> Result<Vec<AniListMedia>>;
}

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(rename = "Page")]
    page: Option<PageData>,
}

#[derive(Debug, Deserialize)]
struct PageData {
    media: Option<Vec<AniListMedia>>,
}

/// GraphQL client for the public AniList API
pub struct AniListClient {
    client: reqwest::Client,
    token: String,
}

impl AniListClient {
    pub fn new(client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }
}

#[async_trait]
impl AniListSearch for AniListClient {
    async fn search(&self, title: &str) -> Result<Vec<AniListMedia>> {
        let request = GraphQLRequest {
            query: SEARCH_QUERY,
            variables: serde_json::json!({ "search": title }),
        };

        let response: SearchResponse = self
            .client
            .post(ANILIST_API_URL)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| RemoteError::from_reqwest(SERVICE, e))?
            .json()
            .await
            .map_err(|e| RemoteError::from_reqwest(SERVICE, e))?;

        Ok(response
            .data
            .and_then(|d| d.page)
            .and_then(|p| p.media)
            .unwrap_or_default())
    }
}

/// Fills the AniList id of an anime from its titles
pub struct AniListMapper {
    search: Box<dyn AniListSearch>,
}

impl AniListMapper {
    pub fn new(search: Box<dyn AniListSearch>) -> Self {
        Self { search }
    }

    /// Search AniList with the canonical titles of the anime
    ///
    /// Candidates are queried in order until one yields an exact match. A
    /// candidate derived from a trailing `(YYYY)` only accepts media from that
    /// season year. Without an exact match the closest title within the
    /// language's threshold is taken.
    pub async fn apply(
        &self,
        id: &mut AnimeId,
        titles: &[TitleVariant],
        overwrite: bool,
    ) -> Result<()> {
        if id.has(Provider::AniList) && !overwrite {
            return Ok(());
        }

        let mut exact = None;
        let mut best = BestMatch::default();

        for candidate in search_candidates(titles, SEARCH_TITLES) {
            if exact.is_some() {
                break;
            }

            let japanese = candidate.language == "ja";
            let threshold = threshold(&candidate);
            let wanted = candidate.title.to_lowercase();

            for media in self.search.search(&candidate.title).await? {
                let found = if japanese {
                    media.title.native.as_deref()
                } else {
                    media.title.romaji.as_deref()
                };
                let Some(found) = found.map(str::to_lowercase) else {
                    continue;
                };

                match candidate.year {
                    Some(year) if media.season_year == Some(year) => {
                        best.offer(media.id, levenshtein(&wanted, &found), threshold);
                    }
                    Some(_) => {}
                    None if found == wanted => {
                        exact = Some(media.id);
                        break;
                    }
                    None => best.offer(media.id, levenshtein(&wanted, &found), threshold),
                }
            }
        }

        if let Some(anilist) = exact.or(best.id()) {
            debug!("AniList id {anilist} for anime {}", id.primary());
            id.fill(Provider::AniList, SecondaryId::new(anilist), overwrite);
        }
        Ok(())
    }
}
