//! `akiba local-mapping`: curate the operator mapping of one anime

use akiba_core::cache::ensure_dir;
use akiba_core::mapping::local::DEFAULT_TMDB_SEASON;
use akiba_core::mapping::{LocalEntry, LocalMapping};
use clap::Args;

use crate::config::AppConfig;
use crate::error::CliResult;
use crate::terminal::Reporter;

#[derive(Args, Debug, Clone)]
pub struct LocalMappingArgs {
    /// AniDB anime id to manage the mapping for
    pub aid: u64,

    /// Map to this AniList id
    #[arg(long, value_name = "ID", conflicts_with = "no_anilistid")]
    pub anilistid: Option<u64>,

    /// Remove the AniList mapping
    #[arg(long)]
    pub no_anilistid: bool,

    /// Map to this TheMovieDB series id (movie ids are not supported)
    #[arg(long, value_name = "ID", conflicts_with = "no_tmdbid")]
    pub tmdbid: Option<u64>,

    /// Remove the TheMovieDB mapping
    #[arg(long)]
    pub no_tmdbid: bool,

    /// Show the mapping after applying changes
    #[arg(long)]
    pub show: bool,
}

impl LocalMappingArgs {
    fn changes_anything(&self) -> bool {
        self.anilistid.is_some() || self.no_anilistid || self.tmdbid.is_some() || self.no_tmdbid
    }
}

pub async fn run(args: LocalMappingArgs, config: &AppConfig, reporter: &Reporter) -> CliResult<()> {
    let cache = config.cache.to_cache_config();
    reporter.info(&format!("Using cache path: {}", cache.path.display()));
    ensure_dir(&cache.path).await?;

    let mapping = LocalMapping::new(&cache);
    let entry = update(&mapping, &args, reporter).await?;

    if args.show || !args.changes_anything() {
        reporter.info(&describe(args.aid, entry.as_ref()));
    }
    Ok(())
}

/// Apply the requested changes and return the resulting entry
pub async fn update(
    mapping: &LocalMapping,
    args: &LocalMappingArgs,
    reporter: &Reporter,
) -> CliResult<Option<LocalEntry>> {
    mapping.refresh().await?;
    let aid = args.aid;
    let current = mapping.entry(aid).await.unwrap_or_default();

    if let Some(anilist) = args.anilistid {
        mapping.set_anilist(aid, Some(anilist)).await?;
    } else if args.no_anilistid && current.anilist.is_some() {
        reporter.info(&format!("Unmapping AniList ID from AniDB ID {aid}"));
        mapping.set_anilist(aid, None).await?;
    }

    if let Some(tmdb) = args.tmdbid {
        mapping.set_tmdb(aid, Some(tmdb)).await?;
    } else if args.no_tmdbid && current.tmdb.is_some() {
        reporter.info(&format!("Unmapping TheMovieDB ID from AniDB ID {aid}"));
        mapping.set_tmdb(aid, None).await?;
    }

    Ok(mapping.entry(aid).await)
}

fn describe(aid: u64, entry: Option<&LocalEntry>) -> String {
    let Some(entry) = entry.filter(|e| !e.is_empty()) else {
        return format!("AniDB {aid} has no mappings.");
    };

    let anilist = entry
        .anilist
        .map(|id| id.to_string())
        .unwrap_or_else(|| "(no mapping)".into());
    let tmdb = entry
        .tmdb
        .map(|id| format!("{id}:{}", entry.tmdb_season.unwrap_or(DEFAULT_TMDB_SEASON)))
        .unwrap_or_else(|| "(no mapping)".into());
    format!("AniDB {aid} => AniList {anilist}, TheMovieDB {tmdb}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use akiba_core::CacheConfig;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: LocalMappingArgs,
    }

    fn parse(argv: &[&str]) -> LocalMappingArgs {
        let mut full = vec!["akiba"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    #[test]
    fn test_map_and_unmap_conflict() {
        let result =
            Harness::try_parse_from(["akiba", "23", "--anilistid", "1", "--no-anilistid"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_map_then_unmap() {
        let dir = TempDir::new().unwrap();
        let mapping = LocalMapping::new(&CacheConfig::new(dir.path()));
        let reporter = Reporter::plain();

        let args = parse(&["23", "--anilistid", "1", "--tmdbid", "30991"]);
        let entry = update(&mapping, &args, &reporter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.anilist, Some(1));
        assert_eq!(entry.tmdb, Some(30991));
        assert_eq!(
            describe(23, Some(&entry)),
            "AniDB 23 => AniList 1, TheMovieDB 30991:1"
        );

        let entry = update(&mapping, &parse(&["23", "--no-anilistid"]), &reporter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.anilist, None);
        assert_eq!(entry.tmdb, Some(30991));

        // Removing the last id drops the entry
        let entry = update(&mapping, &parse(&["23", "--no-tmdbid"]), &reporter)
            .await
            .unwrap();
        assert!(entry.is_none());
        assert_eq!(describe(23, entry.as_ref()), "AniDB 23 has no mappings.");
    }

    #[tokio::test]
    async fn test_mapping_persists_with_private_mode() {
        let dir = TempDir::new().unwrap();
        let cache = CacheConfig::new(dir.path());
        let mapping = LocalMapping::new(&cache);
        update(&mapping, &parse(&["5", "--anilistid", "7"]), &Reporter::plain())
            .await
            .unwrap();

        let reloaded = LocalMapping::new(&cache);
        reloaded.refresh().await.unwrap();
        assert_eq!(reloaded.entry(5).await.and_then(|e| e.anilist), Some(7));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(mapping.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
