//! Temporary show directories filled with fake episode files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding a show and, optionally, a library target
///
/// Episode content is derived from the file name, so two files with different
/// names never share a fingerprint.
pub struct MediaDir {
    root: TempDir,
}

impl MediaDir {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            root: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Directory below the root, created on demand
    pub fn dir(&self, relative: &str) -> io::Result<PathBuf> {
        let dir = self.root.path().join(relative);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Write an episode of `size` bytes at `relative`
    pub fn episode(&self, relative: &str, size: usize) -> io::Result<PathBuf> {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content(relative, size))?;
        Ok(path)
    }

    /// Write a file with the exact bytes given
    pub fn file(&self, relative: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

fn content(seed: &str, size: usize) -> Vec<u8> {
    let seed = seed.as_bytes();
    (0..size)
        .map(|i| seed[i % seed.len().max(1)].wrapping_add((i / 251) as u8))
        .collect()
}
