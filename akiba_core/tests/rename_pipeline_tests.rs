//! End-to-end tests of identification and relocation against a scripted session

use akiba_core::hashing;
use akiba_core::protocol::{MylistState, ProtocolSession, SessionCredentials};
use akiba_core::{CacheConfig, RenameAction, RenameEngine, RenameOptions, Template};
use akiba_test_utils::{FileReplyBuilder, MediaDir, ScriptedChannel, SentCommands};
use std::path::{Path, PathBuf};

const FORMAT: &str = "{anime_name_romaji}/{episode} - {episode_name}.{filetype}";

async fn engine(media: &MediaDir, channel: ScriptedChannel) -> RenameEngine<ScriptedChannel> {
    let cache = CacheConfig::new(media.dir("cache").unwrap());
    let session = ProtocolSession::new(
        channel,
        SessionCredentials::new("akiba", "1", "user", "pass"),
    );
    RenameEngine::new(
        &cache,
        session,
        Template::compile(FORMAT).unwrap(),
        media.dir("library").unwrap(),
    )
    .await
    .unwrap()
}

/// FILE reply for `file` as episode 01 of Cowboy Bebop
async fn bebop_reply(file: &Path) -> Vec<String> {
    let fingerprint = hashing::fingerprint(file).await.unwrap();
    FileReplyBuilder::new(1, 23)
        .size(fingerprint.size)
        .ed2k(&fingerprint.hash)
        .anime("Cowboy Bebop")
        .episode("01", "Asteroid Blues")
        .fields()
}

fn destination(media: &MediaDir) -> PathBuf {
    media.path().join("library/Cowboy Bebop/01 - Asteroid Blues.mkv")
}

fn mylist_fields(state: MylistState) -> Vec<String> {
    let mut fields = vec!["0".to_string(); 12];
    fields[6] = state.code().to_string();
    fields
}

type Identified = (RenameEngine<ScriptedChannel>, SentCommands, PathBuf);

/// Engine whose channel answers `script` followed by the FILE reply of a fresh episode
async fn identified(media: &MediaDir, script: ScriptedChannel) -> Identified {
    let file = media.episode("incoming/[SG] bebop 01.mkv", 8192).unwrap();
    let channel = script.reply_fields(220, "FILE", bebop_reply(&file).await);
    let sent = channel.sent();
    (engine(media, channel).await, sent, file)
}

#[tokio::test]
async fn test_second_identify_uses_caches() {
    let media = MediaDir::new().unwrap();
    let (mut engine, sent, file) = identified(&media, ScriptedChannel::new().login()).await;

    let first = engine.identify(&file, false, false).await.unwrap();
    let second = engine.identify(&file, false, false).await.unwrap();

    assert_eq!(first.record, second.record);
    assert_eq!(first.fingerprint.hash, second.fingerprint.hash);
    assert_eq!(sent.count("FILE"), 1);

    let record = second.record.unwrap();
    assert_eq!(record.anime_name_romaji, "Cowboy Bebop");
    // Checksums the reply left empty are filled from the local file
    assert_eq!(record.crc32.len(), 8);
}

#[tokio::test]
async fn test_refresh_bypasses_metadata_cache() {
    let media = MediaDir::new().unwrap();
    let file = media.episode("incoming/a.mkv", 1024).unwrap();
    let reply = bebop_reply(&file).await;
    let channel = ScriptedChannel::new()
        .login()
        .reply_fields(220, "FILE", reply.clone())
        .reply_fields(220, "FILE", reply);
    let sent = channel.sent();
    let mut engine = engine(&media, channel).await;

    engine.identify(&file, false, false).await.unwrap();
    engine.identify(&file, true, false).await.unwrap();
    assert_eq!(sent.count("FILE"), 2);
    assert_eq!(sent.count("AUTH"), 1);
}

#[tokio::test]
async fn test_relocate_is_idempotent() {
    let media = MediaDir::new().unwrap();
    let (mut engine, _sent, file) = identified(&media, ScriptedChannel::new().login()).await;

    let mut episode = engine.identify(&file, false, false).await.unwrap();
    let moved = engine
        .relocate(&mut episode, RenameOptions::default())
        .await
        .unwrap();
    assert_eq!(moved.action, RenameAction::Move);
    assert!(destination(&media).is_file());
    assert!(!file.exists());

    let again = engine
        .relocate(&mut episode, RenameOptions::default())
        .await
        .unwrap();
    assert_eq!(again.action, RenameAction::UpToDate);

    // The moved file is still known to the hash cache
    let from_library = engine
        .identify(&destination(&media), false, false)
        .await
        .unwrap();
    assert_eq!(from_library.fingerprint.hash, episode.fingerprint.hash);
}

#[tokio::test]
async fn test_existing_destination_is_kept_without_overwrite() {
    let media = MediaDir::new().unwrap();
    let occupant = media
        .file("library/Cowboy Bebop/01 - Asteroid Blues.mkv", b"already here")
        .unwrap();
    let (mut engine, _sent, file) = identified(&media, ScriptedChannel::new().login()).await;

    let mut episode = engine.identify(&file, false, false).await.unwrap();
    let outcome = engine
        .relocate(&mut episode, RenameOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.action, RenameAction::Skipped);
    assert!(file.exists());
    assert_eq!(std::fs::read(&occupant).unwrap(), b"already here");

    let options = RenameOptions {
        overwrite: true,
        ..RenameOptions::default()
    };
    let outcome = engine.relocate(&mut episode, options).await.unwrap();
    assert_eq!(outcome.action, RenameAction::Move);
    assert!(!file.exists());
    assert_ne!(std::fs::read(&occupant).unwrap(), b"already here");
}

#[tokio::test]
async fn test_mylist_entry_is_added() {
    let media = MediaDir::new().unwrap();
    let (mut engine, sent, file) = identified(&media, ScriptedChannel::new().login()).await;
    let episode = engine.identify(&file, false, false).await.unwrap();
    drop(engine);

    // A fresh engine over the same caches answers FILE from disk
    let channel = ScriptedChannel::new()
        .login()
        .reply(321, "NO SUCH ENTRY")
        .reply(210, "MYLIST ENTRY ADDED");
    let mylist_sent = channel.sent();
    let mut engine = self::engine(&media, channel).await;
    let episode = engine.identify(&episode.path, false, false).await.unwrap();
    assert!(episode.record.is_some());

    let updated = engine
        .mylist_update(&episode, MylistState::InternalStorage)
        .await
        .unwrap();
    assert!(updated);
    assert_eq!(sent.names(), vec!["AUTH", "FILE"]);
    assert_eq!(mylist_sent.names(), vec!["AUTH", "MYLIST", "MYLISTADD"]);
    assert!(mylist_sent.lines()[2].contains("state=1"));
    assert!(mylist_sent.lines()[2].contains("edit=0"));
}

#[tokio::test]
async fn test_mylist_entry_in_wanted_state_is_left_alone() {
    let media = MediaDir::new().unwrap();
    let (mut engine, _sent, file) = identified(&media, ScriptedChannel::new().login()).await;
    let episode = engine.identify(&file, false, false).await.unwrap();
    drop(engine);

    let channel = ScriptedChannel::new().login().reply_fields(
        221,
        "MYLIST",
        mylist_fields(MylistState::ExternalStorage),
    );
    let mylist_sent = channel.sent();
    let mut engine = self::engine(&media, channel).await;

    let updated = engine
        .mylist_update(&episode, MylistState::ExternalStorage)
        .await
        .unwrap();
    assert!(updated);
    assert_eq!(mylist_sent.names(), vec!["AUTH", "MYLIST"]);
}

#[tokio::test]
async fn test_banned_session_is_fatal() {
    let media = MediaDir::new().unwrap();
    let file = media.episode("incoming/a.mkv", 512).unwrap();
    let mut engine = engine(&media, ScriptedChannel::new().reply(555, "BANNED")).await;

    let error = engine.identify(&file, false, false).await.unwrap_err();
    assert!(error.is_fatal());
}
