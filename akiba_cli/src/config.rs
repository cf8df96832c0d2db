use akiba_core::cache::{self, CacheConfig, PRIVATE_FILE_MODE};
use akiba_core::protocol::{DEFAULT_PORT, DEFAULT_SERVER, SessionCredentials};
use akiba_core::rename::{DEFAULT_FORMAT, Template};
use colored::Colorize;
use dialoguer::{Input, Password};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};
use crate::paths;

/// Prefix of environment variables overriding configuration values
pub const ENV_PREFIX: &str = "AKIBA_";

/// Keys whose values are never printed by `config list`
const SECRET_KEYS: &[&str] = &[
    "anidb.udp_client.password",
    "anidb.udp_client.api_key",
    "anilist.token",
    "tmdb.api_key",
];

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub anidb: AniDbConfig,

    #[serde(default)]
    pub anilist: AniListConfig,

    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub renamer: RenamerConfig,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AniDbConfig {
    #[serde(default)]
    pub udp_client: UdpClientConfig,
}

/// Registered UDP client and account used for file lookups
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct UdpClientConfig {
    pub host: String,
    pub name: String,
    pub version: String,
    pub username: String,
    pub password: String,
    /// Enables session encryption when set
    pub api_key: String,
}

impl Default for UdpClientConfig {
    fn default() -> Self {
        Self {
            host: format!("{DEFAULT_SERVER}:{DEFAULT_PORT}"),
            name: String::new(),
            version: String::new(),
            username: String::new(),
            password: String::new(),
            api_key: String::new(),
        }
    }
}

impl UdpClientConfig {
    pub fn credentials(&self) -> SessionCredentials {
        SessionCredentials::new(
            &self.name,
            &self.version,
            &self.username,
            self.password.as_str(),
        )
        .with_api_key(self.api_key.as_str())
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct AniListConfig {
    pub token: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct TmdbConfig {
    pub api_key: String,
}

/// Cache location and max ages in days
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct CacheSettings {
    pub path: PathBuf,
    pub metadata_age: u32,
    pub mapping_age: u32,
    pub hash_age: u32,
    pub title_age: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: paths::cache_dir(),
            metadata_age: cache::DEFAULT_METADATA_AGE,
            mapping_age: cache::DEFAULT_MAPPING_AGE,
            hash_age: cache::DEFAULT_HASH_AGE,
            title_age: cache::DEFAULT_TITLE_AGE,
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            path: self.path.clone(),
            metadata_age: self.metadata_age,
            mapping_age: self.mapping_age,
            hash_age: self.hash_age,
            title_age: self.title_age,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RenamerConfig {
    #[serde(default = "default_format")]
    pub format: String,

    /// Destination root, the working directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<PathBuf>,
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

impl Default for RenamerConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            target_path: None,
        }
    }
}

impl AppConfig {
    /// Ensure everything the rename command needs is configured
    pub fn validate_for_rename(&self) -> CliResult<()> {
        let udp = &self.anidb.udp_client;
        let required = [
            ("anidb.udp_client.host", &udp.host),
            ("anidb.udp_client.name", &udp.name),
            ("anidb.udp_client.version", &udp.version),
            ("anidb.udp_client.username", &udp.username),
            ("anidb.udp_client.password", &udp.password),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect();

        if !missing.is_empty() {
            return Err(CliError::config(format!(
                "missing required settings: {}",
                missing.join(", ")
            ))
            .with_suggestion("Run 'akiba config init' or 'akiba config set <key> <value>'"));
        }

        Template::compile(&self.renamer.format)
            .map_err(|e| CliError::config(format!("renamer.format: {e}")))?;
        Ok(())
    }
}

/// Configuration manager for the layered configuration and its TOML file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a ConfigManager for `$AKIBA_CONFIG` or the XDG location
    pub fn new() -> Self {
        Self {
            config_path: paths::config_path(),
        }
    }

    /// Create a ConfigManager with a specific path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    pub fn load(&self) -> CliResult<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if self.config_path.exists() {
            debug!("Loading configuration from {}", self.config_path.display());
            figment = figment.merge(Toml::file(&self.config_path));
        }

        // AKIBA_CONFIG names the file itself
        figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"));

        figment.extract().map_err(|e| {
            CliError::config(format!(
                "failed to load {}: {e}",
                self.config_path.display()
            ))
        })
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> CliResult<String> {
        let value = Self::to_value(&self.load()?)?;

        let mut current = &value;
        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table
                        .get(part)
                        .ok_or_else(|| CliError::usage(format!("Key '{key}' not found")))?;
                }
                _ => return Err(CliError::usage(format!("Invalid key path: {key}"))),
            }
        }

        scalar(current)
            .ok_or_else(|| CliError::usage(format!("Value at '{key}' is not a simple type")))
    }

    /// Set a configuration value by key (dot notation) and persist the file
    pub async fn set(&self, key: &str, value: &str) -> CliResult<()> {
        let parsed = parse_config_value(key, value)?;

        let mut document = if self.config_path.exists() {
            let content = tokio::fs::read_to_string(&self.config_path)
                .await
                .map_err(|e| CliError::io(format!("{}: {e}", self.config_path.display())))?;
            toml::from_str::<toml::Value>(&content).map_err(|e| {
                CliError::config(format!("{}: {e}", self.config_path.display()))
            })?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, sections)) = parts.split_last() else {
            return Err(CliError::usage("Empty key"));
        };

        let mut current = &mut document;
        for part in sections {
            let toml::Value::Table(table) = current else {
                return Err(CliError::config(format!(
                    "Invalid key path: expected table at '{part}'"
                )));
            };
            current = table
                .entry(part.to_string())
                .or_insert(toml::Value::Table(toml::map::Map::new()));
        }
        let toml::Value::Table(table) = current else {
            return Err(CliError::config(format!("Cannot set '{key}' on a non-table")));
        };
        table.insert(last.to_string(), parsed);

        // Reject documents the loader could not read back
        document
            .clone()
            .try_into::<AppConfig>()
            .map_err(|e| CliError::usage(format!("Invalid value for '{key}': {e}")))?;

        let content = toml::to_string_pretty(&document)
            .map_err(|e| CliError::general(format!("Failed to serialize configuration: {e}")))?;
        cache::write_file(&self.config_path, &content, PRIVATE_FILE_MODE).await?;
        Ok(())
    }

    /// List all configuration values with secrets masked
    pub fn list(&self) -> CliResult<Vec<(String, String)>> {
        let value = Self::to_value(&self.load()?)?;

        let mut items = Vec::new();
        collect_values(&value, String::new(), &mut items);
        for (key, value) in &mut items {
            if SECRET_KEYS.contains(&key.as_str()) && !value.is_empty() {
                *value = "***".to_string();
            }
        }
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(items)
    }

    fn to_value(config: &AppConfig) -> CliResult<toml::Value> {
        toml::Value::try_from(config)
            .map_err(|e| CliError::general(format!("Failed to serialize configuration: {e}")))
    }
}

fn scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Recursively collect all key-value pairs from TOML
fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_values(val, new_prefix, items);
            }
        }
        other => {
            if let Some(scalar) = scalar(other) {
                items.push((prefix, scalar));
            }
        }
    }
}

/// Parse a value to the TOML type of its key
fn parse_config_value(key: &str, value: &str) -> CliResult<toml::Value> {
    match key {
        k if k.starts_with("cache.") && k.ends_with("_age") => {
            let days: i64 = value
                .parse()
                .map_err(|_| CliError::usage(format!("{key} must be a number of days")))?;
            if days < 0 {
                return Err(CliError::usage(format!("{key} must not be negative")));
            }
            Ok(toml::Value::Integer(days))
        }
        "renamer.format" => {
            Template::compile(value)
                .map_err(|e| CliError::from(akiba_core::Error::from(e)))?;
            Ok(toml::Value::String(value.to_string()))
        }
        "renamer.target_path" => {
            let path = std::path::absolute(value)
                .map_err(|e| CliError::usage(format!("{key}: {e}")))?;
            Ok(toml::Value::String(path.to_string_lossy().into_owned()))
        }
        _ => Ok(toml::Value::String(value.to_string())),
    }
}

/// Interactive setup of the UDP client registration and account
pub async fn interactive_init(manager: &ConfigManager) -> CliResult<()> {
    println!("{}", "Akiba Setup".bold());
    println!("{}", "===========".bold());
    println!();
    println!("This tool requires:");
    println!("  • An AniDB account (create at https://anidb.net)");
    println!("  • A registered UDP client (register at https://anidb.net/software/add)");
    println!();

    let current = manager.load()?.anidb.udp_client;
    let prompt_error = |e: dialoguer::Error| CliError::general(format!("Failed to read input: {e}"));

    let name: String = Input::new()
        .with_prompt("Client name")
        .with_initial_text(current.name)
        .interact_text()
        .map_err(prompt_error)?;
    let version: String = Input::new()
        .with_prompt("Client version")
        .with_initial_text(current.version)
        .validate_with(|input: &String| -> Result<(), &str> {
            input
                .parse::<u32>()
                .map(|_| ())
                .map_err(|_| "Must be a positive integer")
        })
        .interact_text()
        .map_err(prompt_error)?;
    let username: String = Input::new()
        .with_prompt("Username")
        .with_initial_text(current.username)
        .interact_text()
        .map_err(prompt_error)?;
    let password = Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(prompt_error)?;
    let api_key = Password::new()
        .with_prompt("UDP API key (empty disables encryption)")
        .allow_empty_password(true)
        .interact()
        .map_err(prompt_error)?;

    manager.set("anidb.udp_client.name", &name).await?;
    manager.set("anidb.udp_client.version", &version).await?;
    manager.set("anidb.udp_client.username", &username).await?;
    manager.set("anidb.udp_client.password", &password).await?;
    manager.set("anidb.udp_client.api_key", &api_key).await?;

    println!();
    println!("{}", "✓ Configuration saved".green());
    println!("  {}", manager.config_path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> ConfigManager {
        ConfigManager::with_path(dir.path().join("akiba").join("config.toml"))
    }

    #[test]
    #[serial]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config = manager(&dir).load().unwrap();

        assert_eq!(config.anidb.udp_client.host, "api.anidb.net:9000");
        assert_eq!(config.cache.metadata_age, 90);
        assert_eq!(config.cache.mapping_age, 7);
        assert_eq!(config.cache.hash_age, 30);
        assert_eq!(config.renamer.format, DEFAULT_FORMAT);
        assert!(config.renamer.target_path.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn test_set_get_roundtrip_and_modes() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);

        manager.set("anidb.udp_client.username", "spike").await.unwrap();
        manager.set("cache.hash_age", "14").await.unwrap();

        assert_eq!(manager.get("anidb.udp_client.username").unwrap(), "spike");
        assert_eq!(manager.get("cache.hash_age").unwrap(), "14");

        let written = std::fs::read_to_string(manager.config_path()).unwrap();
        assert!(written.contains("hash_age = 14"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let file = std::fs::metadata(manager.config_path()).unwrap();
            assert_eq!(file.permissions().mode() & 0o777, 0o600);
            let parent = std::fs::metadata(manager.config_path().parent().unwrap()).unwrap();
            assert_eq!(parent.permissions().mode() & 0o777, 0o750);
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_set_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);

        let age = manager.set("cache.title_age", "soon").await.unwrap_err();
        assert_eq!(age.exit_code(), crate::error::ExitCode::Usage);

        let format = manager.set("renamer.format", "{nope}").await.unwrap_err();
        assert_eq!(format.exit_code(), crate::error::ExitCode::TemplateError);

        assert!(!manager.config_path().exists());
    }

    #[tokio::test]
    #[serial]
    async fn test_list_masks_secrets() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        manager.set("anidb.udp_client.password", "hunter2").await.unwrap();

        let items = manager.list().unwrap();
        let password = items
            .iter()
            .find(|(key, _)| key == "anidb.udp_client.password")
            .unwrap();
        assert_eq!(password.1, "***");
        assert!(items.iter().any(|(key, _)| key == "renamer.format"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        std::fs::create_dir_all(manager.config_path().parent().unwrap()).unwrap();
        std::fs::write(
            manager.config_path(),
            "[anidb.udp_client]\nusername = \"from-file\"\n",
        )
        .unwrap();

        // SAFETY: serialized with every other test touching the environment
        unsafe { std::env::set_var("AKIBA_ANIDB__UDP_CLIENT__USERNAME", "from-env") };
        let config = manager.load().unwrap();
        unsafe { std::env::remove_var("AKIBA_ANIDB__UDP_CLIENT__USERNAME") };

        assert_eq!(config.anidb.udp_client.username, "from-env");
    }

    #[test]
    fn test_validate_for_rename() {
        let mut config = AppConfig::default();
        let error = config.validate_for_rename().unwrap_err();
        assert_eq!(error.exit_code(), crate::error::ExitCode::ConfigError);
        assert!(error.to_string().contains("anidb.udp_client.username"));

        let udp = &mut config.anidb.udp_client;
        udp.name = "akiba".into();
        udp.version = "1".into();
        udp.username = "spike".into();
        udp.password = "hunter2".into();
        assert!(config.validate_for_rename().is_ok());

        config.renamer.format = "{nope}".into();
        assert!(config.validate_for_rename().is_err());
    }
}
