//! Centralized path management for the akiba CLI
//!
//! Configuration and cache locations follow the XDG base directory layout on
//! every platform `dirs` knows about.

use std::env;
use std::path::PathBuf;

/// The name of the application directory below the config and cache roots
const APP_DIR: &str = "akiba";

/// The name of the configuration file
const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV: &str = "AKIBA_CONFIG";

/// Returns the configuration directory, `~/.config/akiba` on Linux
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".akiba"))
}

/// Returns the configuration file path
///
/// `AKIBA_CONFIG` wins over the default location when it is set and not
/// empty.
pub fn config_path() -> PathBuf {
    match env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join(CONFIG_FILE),
    }
}

/// Returns the default cache directory, `~/.cache/akiba` on Linux
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".akiba").join("cache"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_dirs_end_with_app_dir() {
        assert!(config_dir().ends_with(APP_DIR));
        assert!(cache_dir().to_string_lossy().contains(APP_DIR));
    }

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        // SAFETY: serialized with every other test touching the environment
        unsafe { env::set_var(CONFIG_ENV, "/tmp/akiba-test/config.toml") };
        assert_eq!(config_path(), PathBuf::from("/tmp/akiba-test/config.toml"));

        unsafe { env::set_var(CONFIG_ENV, "") };
        assert_eq!(config_path(), config_dir().join(CONFIG_FILE));

        unsafe { env::remove_var(CONFIG_ENV) };
        assert_eq!(config_path(), config_dir().join(CONFIG_FILE));
    }
}
