//! Filesystem helpers for cache artifacts

use crate::Result;
use crate::error::io;
use std::path::Path;

/// Mode for cache directories
pub const DIR_MODE: u32 = 0o750;
/// Mode for cache files
pub const FILE_MODE: u32 = 0o660;
/// Mode for files holding operator data
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Create `dir` and its parents with [`DIR_MODE`]
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    if tokio::fs::metadata(dir).await.is_ok_and(|m| m.is_dir()) {
        return Ok(());
    }

    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(dir).await.map_err(io::at(dir))?;
    Ok(())
}

/// Write `contents` to `path`, creating the parent directory, then apply `mode`
pub async fn write_file(path: &Path, contents: &str, mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }

    tokio::fs::write(path, contents).await.map_err(io::at(path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(io::at(path))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}

/// Stable identifier of this machine, used to name the hash cache
///
/// Hash caches hold absolute paths, which only make sense on the machine that
/// produced them.
pub fn machine_id() -> String {
    ["/etc/machine-id", "/var/lib/dbus/machine-id"]
        .iter()
        .filter_map(|candidate| std::fs::read_to_string(candidate).ok())
        .map(|id| id.trim().to_string())
        .find(|id| !id.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()))
        .unwrap_or_else(|| "localhost".to_string())
}
