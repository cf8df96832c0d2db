//! `akiba identify`: resolve a show directory to its ids and episodes

use akiba_core::episodes::{EpisodeFile, episodes};
use akiba_core::mapping::local::DEFAULT_TMDB_SEASON;
use akiba_core::mapping::{
    AniListClient, AniListMapper, HttpMappingFeed, ListMapping, LocalMapping, TmdbClient,
    TmdbMapper,
};
use akiba_core::titles::{HttpTitleSource, TitleSource};
use akiba_core::{AnimeId, IdentifierResolver, Provider, SecondaryId, TitleIndex};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::terminal::Reporter;

#[derive(Args, Debug, Clone)]
pub struct IdentifyArgs {
    /// Path to an anime show directory
    pub path: PathBuf,

    /// Use this AniDB anime id instead of resolving the directory name
    #[arg(long)]
    pub aid: Option<u64>,

    /// Use this AniList id
    #[arg(long)]
    pub anilistid: Option<u64>,

    /// Use this TheMovieDB series id (season 1)
    #[arg(long)]
    pub tmdbid: Option<u64>,

    /// Let mappings replace ids that are already known
    #[arg(long)]
    pub overwrite: bool,
}

/// What `identify` found for a directory
#[derive(Debug, Clone)]
pub struct Identification {
    pub title: String,
    pub id: AnimeId,
    pub episodes: Vec<EpisodeFile>,
}

pub async fn run(args: IdentifyArgs, config: &AppConfig, reporter: &Reporter) -> CliResult<()> {
    let http = reqwest::Client::new();
    let cache = config.cache.to_cache_config();

    let mut titles = TitleIndex::new(&cache, HttpTitleSource::new(http.clone()));
    let mut resolver = IdentifierResolver::new(
        LocalMapping::new(&cache),
        ListMapping::new(&cache, Box::new(HttpMappingFeed::new(http.clone()))),
    );
    if !config.anilist.token.is_empty() {
        let client = AniListClient::new(http.clone(), config.anilist.token.as_str());
        resolver = resolver.with_anilist(AniListMapper::new(Box::new(client)));
    }
    if !config.tmdb.api_key.is_empty() {
        let client = TmdbClient::new(http, config.tmdb.api_key.as_str());
        resolver = resolver.with_tmdb(TmdbMapper::new(Box::new(client)));
    }

    let found = identify(&args, &mut titles, &resolver, reporter).await?;
    print(&found, reporter);
    Ok(())
}

/// Resolve the directory name, then fill secondary ids in precedence order
///
/// Ids given on the command line are set first so the mapping sources only
/// replace them with `--overwrite`.
pub async fn identify<S: TitleSource>(
    args: &IdentifyArgs,
    titles: &mut TitleIndex<S>,
    resolver: &IdentifierResolver,
    reporter: &Reporter,
) -> CliResult<Identification> {
    if !args.path.is_dir() {
        return Err(CliError::io(format!(
            "Directory \"{}\" does not exist",
            args.path.display()
        )));
    }
    let mut title = directory_name(&args.path);

    titles.refresh().await?;
    resolver.refresh().await?;

    reporter.step(&format!("{title}: Identifying ..."));
    let resolved = match args.aid {
        Some(aid) => Some(AnimeId::new(aid)),
        None => titles.resolve(&title),
    };
    let Some(mut id) = resolved else {
        reporter.error(&format!("{title}: Identifying ..."));
        return Err(CliError::general(format!("Failed to identify \"{title}\""))
            .with_suggestion("Pass the AniDB id with --aid"));
    };

    // Normalize to the main romanized title
    if let Some(main) = titles
        .titles_of(&id)
        .iter()
        .find(|t| t.is(&akiba_core::TitleKind::Main, "x-jat"))
    {
        title = main.title.clone();
    }
    reporter.done(&format!("{title}: Identifying ..."));

    if let Some(anilist) = args.anilistid {
        id.fill(Provider::AniList, SecondaryId::new(anilist), true);
    }
    if let Some(tmdb) = args.tmdbid {
        id.fill(
            Provider::Tmdb,
            SecondaryId::with_season(tmdb, DEFAULT_TMDB_SEASON),
            true,
        );
    }

    reporter.step(&format!("{title}: Mapping IDs ..."));
    let known_titles = titles.titles_of(&id);
    resolver
        .apply(&mut id, known_titles, args.overwrite)
        .await?;
    reporter.done(&format!("{title}: Mapping IDs ..."));

    Ok(Identification {
        title,
        episodes: episodes(&args.path).await?,
        id,
    })
}

fn print(found: &Identification, reporter: &Reporter) {
    let id = &found.id;
    reporter.info(&format!("AniDB: {}", id.primary()));
    reporter.info(&format!(
        "AniList: {}",
        id.anilist()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "(no mapping)".into())
    ));
    reporter.info(&format!(
        "TheMovieDB: {}",
        id.tmdb()
            .map(|t| format!("{t}:{}", id.tmdb_season().unwrap_or(DEFAULT_TMDB_SEASON)))
            .unwrap_or_else(|| "(no mapping)".into())
    ));

    for episode in &found.episodes {
        let number = if episode.is_multi_episode() {
            format!("{}-{}", episode.episode_start, episode.episode_end)
        } else {
            episode.episode_start.clone()
        };
        reporter.info(&format!("{number}: {}", episode.title));
    }
}

fn directory_name(path: &Path) -> String {
    std::path::absolute(path)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| path.display().to_string())
}
