//! Moving, copying and symlinking files into place

use crate::Result;
use crate::error::io;
use async_trait::async_trait;
use log::{debug, info};
use std::path::Path;

/// `EXDEV` on Linux and macOS
const CROSS_DEVICE_OS_ERROR: i32 = 18;

/// Filesystem primitives used for relocation, swappable in tests
#[async_trait]
pub trait FileOps: Send + Sync {
    async fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()>;
    async fn copy(&self, from: &Path, to: &Path) -> std::io::Result<()>;
    async fn remove(&self, path: &Path) -> std::io::Result<()>;
    async fn symlink(&self, target: &Path, link: &Path) -> std::io::Result<()>;
}

/// [`FileOps`] backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileOps;

#[async_trait]
impl FileOps for TokioFileOps {
    async fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        tokio::fs::rename(from, to).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        tokio::fs::copy(from, to).await.map(|_| ())
    }

    async fn remove(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    #[cfg(unix)]
    async fn symlink(&self, target: &Path, link: &Path) -> std::io::Result<()> {
        tokio::fs::symlink(target, link).await
    }

    #[cfg(windows)]
    async fn symlink(&self, target: &Path, link: &Path) -> std::io::Result<()> {
        tokio::fs::symlink_file(target, link).await
    }
}

/// Whether a rename failed only because source and destination live on
/// different filesystems
pub fn is_cross_device(error: &std::io::Error) -> bool {
    error.kind() == std::io::ErrorKind::CrossesDevices
        || error.raw_os_error() == Some(CROSS_DEVICE_OS_ERROR)
}

/// Move `from` to `to`, copying and removing the source when a plain rename
/// crosses devices
pub async fn move_file(ops: &dyn FileOps, from: &Path, to: &Path) -> Result<()> {
    match ops.rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            info!(
                "{} is on another device, copying instead of renaming",
                to.display()
            );
            ops.copy(from, to).await.map_err(io::at(to))?;
            ops.remove(from).await.map_err(io::at(from))?;
            Ok(())
        }
        Err(e) => Err(io::at(from)(e).into()),
    }
}

/// Leave a symlink at `link` pointing to `target`
pub async fn link_back(ops: &dyn FileOps, target: &Path, link: &Path) -> Result<()> {
    debug!("Linking {} -> {}", link.display(), target.display());
    ops.symlink(target, link).await.map_err(io::at(link))?;
    Ok(())
}
