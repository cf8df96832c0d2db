//! `akiba rename`: identify episode files and move them into the library

use akiba_core::protocol::{
    CommandChannel, MylistState, ProtocolClient, ProtocolConfig, ProtocolSession,
};
use akiba_core::{RenameAction, RenameEngine, RenameOptions, RenameOutcome, Template};
use clap::Args;
use log::debug;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::file_discovery::{IgnoreFilter, discover};
use crate::terminal::Reporter;

#[derive(Args, Debug, Clone)]
pub struct RenameArgs {
    /// Path to an anime show directory or episode file
    pub path: PathBuf,

    /// Force rehash of already hashed files
    #[arg(long)]
    pub rehash: bool,

    /// Ignore cached metadata and query AniDB again
    #[arg(long)]
    pub refresh: bool,

    /// Overwrite if the destination already exists
    #[arg(long)]
    pub overwrite: bool,

    /// Copy instead of moving
    #[arg(long)]
    pub copy: bool,

    /// Leave a symlink from the old path to the new path
    #[arg(long, conflicts_with = "copy")]
    pub symlink: bool,

    /// Only report what would be done
    #[arg(long)]
    pub dry_run: bool,

    /// Override the format of the destination path
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<Template>,

    /// Override the destination directory
    #[arg(long, value_name = "PATH", value_parser = parse_target_path)]
    pub target_path: Option<PathBuf>,

    /// Only print ed2k links, without contacting AniDB
    #[arg(long = "print-ed2klinks")]
    pub print_ed2klinks: bool,

    /// Update the MyList entry of every identified file to this state
    #[arg(long, value_name = "STATE")]
    pub mylist: Option<MylistState>,
}

impl RenameArgs {
    fn options(&self) -> RenameOptions {
        RenameOptions {
            overwrite: self.overwrite,
            copy: self.copy,
            symlink: self.symlink,
            dry_run: self.dry_run,
        }
    }
}

fn parse_target_path(value: &str) -> Result<PathBuf, String> {
    let path = std::path::absolute(value).map_err(|e| e.to_string())?;
    if !path.is_dir() {
        return Err(format!(
            "Path {} is not a directory or does not exist",
            path.display()
        ));
    }
    Ok(path)
}

/// Destination directory: the flag, then the configured path, then the working directory
fn target_path(args: &RenameArgs, config: &AppConfig) -> CliResult<PathBuf> {
    match args.target_path.as_ref().or(config.renamer.target_path.as_ref()) {
        Some(target) => std::path::absolute(target).map_err(|e| {
            CliError::io(format!("Cannot resolve target path {}: {e}", target.display()))
        }),
        None => std::env::current_dir()
            .map_err(|e| CliError::io(format!("Cannot resolve the working directory: {e}"))),
    }
}

pub async fn run(args: RenameArgs, config: &AppConfig, reporter: &Reporter) -> CliResult<()> {
    let hash_only = args.print_ed2klinks;
    if !hash_only {
        config.validate_for_rename()?;
    }

    let files = discover(&args.path, &IgnoreFilter::default())?;
    debug!("Discovered {} files under {}", files.len(), args.path.display());

    let template = match &args.format {
        Some(template) => template.clone(),
        None => Template::compile(&config.renamer.format).map_err(akiba_core::Error::from)?,
    };
    let target = target_path(&args, config)?;

    let udp = &config.anidb.udp_client;
    let session = ProtocolSession::new(
        ProtocolClient::new(ProtocolConfig::for_server(&udp.host)),
        udp.credentials(),
    );
    let mut engine = RenameEngine::new(&config.cache.to_cache_config(), session, template, target)
        .await?
        .with_rehash(args.rehash);

    if hash_only {
        reporter.info("Printing ed2k links ...");
    } else {
        reporter.info(&format!("Target Path: {}", engine.target().display()));
        reporter.info(&format!("Format: {}", engine.template()));
        reporter.info("Renaming files ...");
    }

    let result = rename_files(&mut engine, &files, &args, reporter).await;
    engine.close().await;

    let failed = result?;
    if failed > 0 {
        return Err(CliError::general(format!(
            "{failed} of {} files could not be renamed",
            files.len()
        )));
    }
    Ok(())
}

/// Identify and relocate every file, returning how many failed
///
/// A file that cannot be read or is unknown to AniDB is reported and skipped.
/// A protocol failure ends the run.
pub async fn rename_files<C: CommandChannel>(
    engine: &mut RenameEngine<C>,
    files: &[PathBuf],
    args: &RenameArgs,
    reporter: &Reporter,
) -> CliResult<usize> {
    let hash_only = args.print_ed2klinks;
    let options = args.options();
    let mut failed = 0;

    for file in files {
        let name = display_name(file);
        if !hash_only {
            reporter.step(&format!("{name}: Identifying ..."));
        }

        let mut episode = match engine.identify(file, args.refresh, hash_only).await {
            Ok(episode) => episode,
            Err(e) if e.is_fatal() => {
                reporter.error(&format!("{name}: Identifying ..."));
                return Err(e.into());
            }
            Err(e) => {
                reporter.error(&format!("{name}: {e}"));
                failed += 1;
                continue;
            }
        };

        if hash_only {
            // Raw output for piping
            println!("{}", episode.fingerprint.link);
            continue;
        }

        if episode.record.is_none() {
            reporter.error(&format!("{name}: Unknown to AniDB"));
            failed += 1;
            continue;
        }
        reporter.done(&format!("{name}: Identifying ..."));

        if let Some(state) = args.mylist {
            reporter.step(&format!("{name}: Updating MyList ..."));
            if engine.mylist_update(&episode, state).await? {
                reporter.done(&format!("{name}: MyList set to {state}"));
            } else {
                reporter.warn(&format!("{name}: MyList not updated"));
            }
        }

        match engine.relocate(&mut episode, options).await {
            Ok(outcome) => report(reporter, &name, &outcome, options.dry_run),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                reporter.error(&format!("{name}: {e}"));
                failed += 1;
            }
        }
    }

    Ok(failed)
}

fn report(reporter: &Reporter, name: &str, outcome: &RenameOutcome, dry_run: bool) {
    let destination = outcome
        .destination
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    let prefix = if dry_run { "[dry-run] " } else { "" };

    match outcome.action {
        RenameAction::Move | RenameAction::Copy | RenameAction::Symlink => {
            reporter.done(&format!("{prefix}{name}: {} -> {destination}", outcome.action));
        }
        RenameAction::UpToDate => reporter.info(&format!("{name}: Already in place")),
        RenameAction::Skipped => {
            reporter.warn(&format!("{name}: {destination} already exists, skipping"));
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use akiba_core::hashing;
    use akiba_core::protocol::{ProtocolError, SessionCredentials};
    use akiba_core::{CacheConfig, RenameEngine};
    use akiba_test_utils::{FileReplyBuilder, MediaDir, ScriptedChannel};
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RenameArgs,
    }

    fn args(extra: &[&str]) -> RenameArgs {
        let mut argv = vec!["akiba", "/show"];
        argv.extend_from_slice(extra);
        Harness::parse_from(argv).args
    }

    async fn engine(
        media: &MediaDir,
        channel: ScriptedChannel,
    ) -> RenameEngine<ScriptedChannel> {
        let cache = CacheConfig::new(media.dir("cache").unwrap());
        let session = ProtocolSession::new(
            channel,
            SessionCredentials::new("akiba", "1", "user", "pass"),
        );
        RenameEngine::new(
            &cache,
            session,
            Template::compile("{anime_name_romaji}/{episode} - {episode_name}.{filetype}").unwrap(),
            media.dir("library").unwrap(),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_relative_configured_target_is_made_absolute() {
        let mut config = AppConfig::default();
        config.renamer.target_path = Some(PathBuf::from("library"));

        let target = target_path(&args(&[]), &config).unwrap();
        assert!(target.is_absolute());
        assert_eq!(target, std::env::current_dir().unwrap().join("library"));
    }

    #[test]
    fn test_target_defaults_to_working_directory() {
        let target = target_path(&args(&[]), &AppConfig::default()).unwrap();
        assert_eq!(target, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_symlink_conflicts_with_copy() {
        let result = Harness::try_parse_from(["akiba", "/show", "--copy", "--symlink"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_parse() {
        let args = args(&["--dry-run", "--mylist", "internal_storage", "--format", "{fid}"]);
        assert!(args.dry_run);
        assert_eq!(args.mylist, Some(MylistState::InternalStorage));
        assert_eq!(args.format.unwrap().to_string(), "{fid}");

        let bad = Harness::try_parse_from(["akiba", "/show", "--format", "{nope}"]);
        assert!(bad.is_err());
    }

    #[tokio::test]
    async fn test_moves_identified_files() {
        let media = MediaDir::new().unwrap();
        let file = media.episode("show/Bebop 01.mkv", 4096).unwrap();
        let fingerprint = hashing::fingerprint(&file).await.unwrap();

        let channel = ScriptedChannel::new().login().reply_fields(
            220,
            "FILE",
            FileReplyBuilder::new(1, 23)
                .size(fingerprint.size)
                .ed2k(&fingerprint.hash)
                .anime("Cowboy Bebop")
                .episode("01", "Asteroid Blues")
                .fields(),
        );
        let sent = channel.sent();
        let mut engine = engine(&media, channel).await;

        let files = [file.clone()];
        let failed = rename_files(&mut engine, &files, &args(&[]), &Reporter::plain())
            .await
            .unwrap();

        assert_eq!(failed, 0);
        assert!(!file.exists());
        assert!(
            media
                .path()
                .join("library/Cowboy Bebop/01 - Asteroid Blues.mkv")
                .is_file()
        );
        assert_eq!(sent.names(), vec!["AUTH", "FILE"]);
    }

    #[tokio::test]
    async fn test_unknown_files_are_counted_and_skipped() {
        let media = MediaDir::new().unwrap();
        let first = media.episode("show/a.mkv", 100).unwrap();
        let second = media.episode("show/b.mkv", 200).unwrap();

        let channel = ScriptedChannel::new()
            .login()
            .reply(320, "NO SUCH FILE")
            .reply(320, "NO SUCH FILE");
        let mut engine = engine(&media, channel).await;

        let files = [first.clone(), second];
        let failed = rename_files(&mut engine, &files, &args(&[]), &Reporter::plain())
            .await
            .unwrap();

        assert_eq!(failed, 2);
        assert!(first.exists());
    }

    #[tokio::test]
    async fn test_protocol_error_aborts_queue() {
        let media = MediaDir::new().unwrap();
        let first = media.episode("show/a.mkv", 100).unwrap();
        let second = media.episode("show/b.mkv", 200).unwrap();

        let channel = ScriptedChannel::new().reply(555, "BANNED");
        let sent = channel.sent();
        let mut engine = engine(&media, channel).await;

        let files = [first, second];
        let error = rename_files(&mut engine, &files, &args(&[]), &Reporter::plain())
            .await
            .unwrap_err();

        assert_eq!(error.exit_code(), crate::error::ExitCode::ProtocolError);
        assert_eq!(sent.names(), vec!["AUTH"]);
    }

    #[tokio::test]
    async fn test_missing_file_does_not_abort() {
        let media = MediaDir::new().unwrap();
        let present = media.episode("show/a.mkv", 100).unwrap();
        let missing = media.path().join("show/gone.mkv");

        let channel = ScriptedChannel::new().login().reply(320, "NO SUCH FILE");
        let mut engine = engine(&media, channel).await;

        let files = [missing, present];
        let failed = rename_files(&mut engine, &files, &args(&[]), &Reporter::plain())
            .await
            .unwrap();
        assert_eq!(failed, 2);
    }

    #[tokio::test]
    async fn test_hash_only_sends_nothing() {
        let media = MediaDir::new().unwrap();
        let file = media.episode("show/a.mkv", 100).unwrap();

        let channel = ScriptedChannel::new().fail(ProtocolError::NotConnected);
        let sent = channel.sent();
        let mut engine = engine(&media, channel).await;

        let failed = rename_files(
            &mut engine,
            &[file.clone()],
            &args(&["--print-ed2klinks"]),
            &Reporter::plain(),
        )
        .await
        .unwrap();

        assert_eq!(failed, 0);
        assert!(file.exists());
        assert!(sent.lines().is_empty());
    }
}
