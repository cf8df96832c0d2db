//! Episode file discovery for the rename command
//!
//! A rename target is either a single file or a show directory. Directories
//! are scanned one level deep; sidecar files, marker files, symlinks and
//! subdirectories are skipped and the rest is naturally sorted.

mod filter;
mod walker;

pub use filter::{DEFAULT_IGNORE_PATTERNS, IgnoreFilter};
pub use walker::discover;

use std::path::PathBuf;

/// Error type for file discovery operations
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("Directory or file \"{}\" does not exist", .0.display())]
    PathNotFound(PathBuf),
}

/// Result type for file discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;
