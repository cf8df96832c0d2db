//! Identification and relocation of episode files
//!
//! [`RenameEngine`] hashes a file, resolves its metadata record through the
//! caches or the protocol session, and moves it to the path rendered from a
//! [`Template`].

pub mod engine;
pub mod relocate;
pub mod sanitize;
pub mod template;

pub use crate::protocol::messages::FileRecord;
pub use engine::{EpisodeRecord, RenameEngine};
pub use relocate::{FileOps, TokioFileOps};
pub use template::{DEFAULT_FORMAT, Tag, Template};

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Flags for a relocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameOptions {
    /// Replace an existing destination
    pub overwrite: bool,
    /// Copy instead of moving
    pub copy: bool,
    /// Leave a symlink at the old path after moving
    pub symlink: bool,
    /// Compute the outcome without touching the filesystem
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameAction {
    Move,
    Copy,
    Symlink,
    UpToDate,
    Skipped,
}

impl fmt::Display for RenameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenameAction::Move => "move",
            RenameAction::Copy => "copy",
            RenameAction::Symlink => "symlink",
            RenameAction::UpToDate => "uptodate",
            RenameAction::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub action: RenameAction,
}
