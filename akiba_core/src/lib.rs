//! Akiba core library
//!
//! Identifies anime episode files by content hash against AniDB, maps the
//! AniDB id onto AniList and TMDB ids, and renames files from a template.
//!
//! - [`hashing`]: ED2K fingerprints and integrity checksums
//! - [`cache`]: on-disk caches for titles, mappings, hashes and metadata
//! - [`titles`]: the AniDB title corpus and title lookup
//! - [`mapping`] and [`resolver`]: secondary id sources and their precedence
//! - [`protocol`]: the AniDB UDP session
//! - [`rename`]: identification and relocation of episode files

pub mod anime;
pub mod cache;
pub mod episodes;
pub mod error;
pub mod hashing;
pub mod mapping;
pub mod matching;
pub mod protocol;
pub mod rename;
pub mod resolver;
pub mod titles;

pub use anime::{AnimeId, Provider, SecondaryId, TitleKind, TitleVariant};
pub use cache::CacheConfig;
pub use error::{Error, Result};
pub use hashing::{Checksums, ContentFingerprint};
pub use protocol::{ProtocolSession, SessionCredentials};
pub use rename::{RenameAction, RenameEngine, RenameOptions, RenameOutcome, Template};
pub use resolver::IdentifierResolver;
pub use titles::TitleIndex;
