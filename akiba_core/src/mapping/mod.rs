//! Secondary identifier sources
//!
//! - [`LocalMapping`]: operator curated overrides
//! - [`ListMapping`]: community maintained id crosswalk
//! - [`AniListMapper`] / [`TmdbMapper`]: title search against remote providers

pub mod anilist;
pub mod list;
pub mod local;
pub mod tmdb;

pub use anilist::{AniListClient, AniListMapper, AniListMedia, AniListSearch, AniListTitle};
pub use list::{HttpMappingFeed, LIST_MAPPING_URL, ListEntry, ListMapping, MappingFeed};
pub use local::{LocalEntry, LocalMapping};
pub use tmdb::{TmdbClient, TmdbMapper, TmdbSearch, TmdbShow};

use crate::anime::{TitleKind, TitleVariant};
use regex::Regex;
use std::sync::LazyLock;

/// Edit distance allowed for romanized titles, wide enough for "Nth Season" suffixes
pub const THRESHOLD_ROMAJI: usize = 12;
/// Edit distance allowed for Japanese titles
pub const THRESHOLD_JAPANESE: usize = 5;

static TITLE_YEAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(.+)\s\((\d{4})\)$").ok());

/// Pick the search candidates among the known titles of an anime
fn candidates(titles: &[TitleVariant], wanted: &[(TitleKind, &str)]) -> Vec<TitleVariant> {
    titles
        .iter()
        .filter(|title| wanted.iter().any(|(kind, language)| title.is(kind, language)))
        .cloned()
        .collect()
}

/// Wanted titles in order, followed by year-qualified variants of those ending in `(YYYY)`
fn search_candidates(titles: &[TitleVariant], wanted: &[(TitleKind, &str)]) -> Vec<TitleVariant> {
    let mut picked = candidates(titles, wanted);

    let with_year: Vec<TitleVariant> = picked
        .iter()
        .filter(|title| title.year.is_none())
        .filter_map(|title| {
            let caps = TITLE_YEAR.as_ref()?.captures(&title.title)?;
            Some(TitleVariant {
                title: caps[1].to_string(),
                year: caps[2].parse().ok(),
                ..title.clone()
            })
        })
        .collect();

    picked.extend(with_year);
    picked
}

/// Fuzzy match threshold for a candidate title
fn threshold(candidate: &TitleVariant) -> usize {
    if candidate.language == "ja" {
        THRESHOLD_JAPANESE
    } else {
        THRESHOLD_ROMAJI
    }
}

/// Threshold-bounded best match tracker, first of equal scores wins
#[derive(Debug, Default)]
struct BestMatch {
    best: Option<(u64, usize)>,
}

impl BestMatch {
    fn offer(&mut self, id: u64, distance: usize, threshold: usize) {
        if distance <= threshold && self.best.is_none_or(|(_, score)| distance < score) {
            self.best = Some((id, distance));
        }
    }

    fn id(&self) -> Option<u64> {
        self.best.map(|(id, _)| id)
    }
}
