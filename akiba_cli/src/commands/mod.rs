//! Subcommand implementations

pub mod config;
pub mod identify;
pub mod local_mapping;
pub mod rename;
