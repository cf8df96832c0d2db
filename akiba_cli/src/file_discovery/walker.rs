//! Directory walker for episode discovery

use akiba_core::matching::natural_cmp;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{DiscoveryError, IgnoreFilter, Result};

/// List the episode files below `path`
///
/// A file path is returned as is. A directory yields its regular files in
/// natural order, without descending into subdirectories or following
/// symlinks.
pub fn discover(path: &Path, filter: &IgnoreFilter) -> Result<Vec<PathBuf>> {
    let metadata = match path.metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DiscoveryError::PathNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
    {
        let entry = entry?;
        if !entry.file_type().is_file() || filter.is_ignored(entry.path()) {
            continue;
        }
        files.push(entry.into_path());
    }

    files.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    Ok(files)
}
