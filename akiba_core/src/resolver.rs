//! Secondary identifier resolution with fixed source precedence

use crate::Result;
use crate::anime::{AnimeId, Provider, TitleVariant};
use crate::mapping::{AniListMapper, ListMapping, LocalMapping, TmdbMapper};
use log::{debug, warn};

/// Fills the secondary ids of an anime from every configured source
///
/// Sources run in precedence order, each one only filling ids that are still
/// absent unless `overwrite` is set:
/// 1. ids already present on the [`AnimeId`] (command line overrides)
/// 2. [`LocalMapping`]
/// 3. [`ListMapping`]
/// 4. remote title search ([`AniListMapper`], then [`TmdbMapper`]), only for
///    ids still absent and only when the provider is configured
pub struct IdentifierResolver {
    local: LocalMapping,
    list: ListMapping,
    anilist: Option<AniListMapper>,
    tmdb: Option<TmdbMapper>,
}

impl IdentifierResolver {
    pub fn new(local: LocalMapping, list: ListMapping) -> Self {
        Self {
            local,
            list,
            anilist: None,
            tmdb: None,
        }
    }

    pub fn with_anilist(mut self, mapper: AniListMapper) -> Self {
        self.anilist = Some(mapper);
        self
    }

    pub fn with_tmdb(mut self, mapper: TmdbMapper) -> Self {
        self.tmdb = Some(mapper);
        self
    }

    /// Load the local mapping and the list mapping
    ///
    /// A list mapping that cannot be downloaded is logged and skipped so the
    /// remaining sources still apply.
    pub async fn refresh(&self) -> Result<()> {
        if !self.local.refresh().await? {
            debug!("No local mapping at {}", self.local.path().display());
        }
        if let Err(e) = self.list.refresh().await {
            warn!("List mapping unavailable: {e}");
        }
        Ok(())
    }

    /// Apply every source to `id` in precedence order
    ///
    /// `titles` are the known titles of the anime, used for remote search.
    pub async fn apply(
        &self,
        id: &mut AnimeId,
        titles: &[TitleVariant],
        overwrite: bool,
    ) -> Result<()> {
        self.local.apply(id, overwrite).await?;
        self.list.apply(id, overwrite).await?;

        if let Some(anilist) = &self.anilist
            && !id.has(Provider::AniList)
        {
            anilist.apply(id, titles, false).await?;
        }
        if let Some(tmdb) = &self.tmdb
            && !id.has(Provider::Tmdb)
        {
            tmdb.apply(id, titles, false).await?;
        }
        Ok(())
    }

    pub fn local(&self) -> &LocalMapping {
        &self.local
    }
}
