//! Command line front end of the akiba renamer
//!
//! The binary parses arguments and dispatches to [`commands`]. Everything the
//! commands need (configuration, discovery, status output, exit codes) lives
//! in this library so it can be tested without spawning the binary.

pub mod commands;
pub mod config;
pub mod error;
pub mod file_discovery;
pub mod paths;
pub mod terminal;
