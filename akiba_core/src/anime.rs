//! Anime identifiers and title variants

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// External catalogue a secondary identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    AniList,
    Tmdb,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AniList => write!(f, "AniList"),
            Self::Tmdb => write!(f, "TMDB"),
        }
    }
}

/// Identifier in a secondary catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryId {
    pub id: u64,
    /// Season inside the provider's series, where the provider splits them
    pub season: Option<u32>,
}

impl SecondaryId {
    pub fn new(id: u64) -> Self {
        Self { id, season: None }
    }

    pub fn with_season(id: u64, season: u32) -> Self {
        Self {
            id,
            season: Some(season),
        }
    }
}

/// Resolved identity of an anime
///
/// The primary id never changes once set. Secondary ids are filled in by the
/// resolver and only replaced when overwriting is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimeId {
    primary: u64,
    secondary: BTreeMap<Provider, SecondaryId>,
}

impl AnimeId {
    pub fn new(primary: u64) -> Self {
        Self {
            primary,
            secondary: BTreeMap::new(),
        }
    }

    pub fn primary(&self) -> u64 {
        self.primary
    }

    pub fn get(&self, provider: Provider) -> Option<SecondaryId> {
        self.secondary.get(&provider).copied()
    }

    pub fn has(&self, provider: Provider) -> bool {
        self.secondary.contains_key(&provider)
    }

    /// Set a secondary id if absent, or unconditionally with `overwrite`.
    ///
    /// Returns whether the value was written.
    pub fn fill(&mut self, provider: Provider, id: SecondaryId, overwrite: bool) -> bool {
        if self.has(provider) && !overwrite {
            return false;
        }
        self.secondary.insert(provider, id);
        true
    }

    pub fn anilist(&self) -> Option<u64> {
        self.get(Provider::AniList).map(|s| s.id)
    }

    pub fn tmdb(&self) -> Option<u64> {
        self.get(Provider::Tmdb).map(|s| s.id)
    }

    pub fn tmdb_season(&self) -> Option<u32> {
        self.get(Provider::Tmdb).and_then(|s| s.season)
    }
}

/// Kind of a title variant in the title corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TitleKind {
    Main,
    Official,
    Other(String),
}

impl From<String> for TitleKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "main" => Self::Main,
            "official" => Self::Official,
            _ => Self::Other(kind),
        }
    }
}

impl From<TitleKind> for String {
    fn from(kind: TitleKind) -> Self {
        match kind {
            TitleKind::Main => "main".to_string(),
            TitleKind::Official => "official".to_string(),
            TitleKind::Other(kind) => kind,
        }
    }
}

/// One title of an anime in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleVariant {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TitleKind,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl TitleVariant {
    pub fn new(title: impl Into<String>, kind: TitleKind, language: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind,
            language: language.into(),
            year: None,
        }
    }

    pub fn is(&self, kind: &TitleKind, language: &str) -> bool {
        &self.kind == kind && self.language == language
    }
}
