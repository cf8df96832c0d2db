//! `akiba config`: inspect and edit the configuration file

use clap::Subcommand;
use colored::*;
use std::collections::BTreeMap;

use crate::config::{self, ConfigManager};
use crate::error::CliResult;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Interactive setup of the AniDB client and account
    Init,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., renamer.format)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., anidb.udp_client.username)
        key: String,
        /// Value to set
        value: String,
    },

    /// List all configuration values
    List,
}

pub async fn run(command: ConfigCommand, manager: &ConfigManager) -> CliResult<()> {
    match command {
        ConfigCommand::Init => config::interactive_init(manager).await?,
        ConfigCommand::Get { key } => println!("{}", manager.get(&key)?),
        ConfigCommand::Set { key, value } => {
            manager.set(&key, &value).await?;
            eprintln!("{}", format!("Set {key}").green());
            eprintln!("Configuration saved to: {}", manager.config_path().display());
        }
        ConfigCommand::List => list(manager)?,
    }
    Ok(())
}

fn list(manager: &ConfigManager) -> CliResult<()> {
    let items = manager.list()?;

    // Group items by section
    let mut sections: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
    for (key, value) in items {
        let (section, rest) = key.split_once('.').unwrap_or(("general", key.as_str()));
        sections
            .entry(section.to_string())
            .or_default()
            .push((rest.to_string(), value));
    }

    println!("{}", "Configuration:".bold().blue());
    println!("Config file: {}", manager.config_path().display());
    println!();
    for (section, items) in sections {
        println!("[{}]", section.yellow());
        for (key, value) in items {
            println!("  {} = {}", key.cyan(), value);
        }
        println!();
    }
    Ok(())
}
