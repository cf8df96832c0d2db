//! Test utilities for the akiba renamer
//!
//! This crate provides scripted collaborators and builders for testing the
//! identification and rename pipeline without network access.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::{FileReplyBuilder, MediaDir};
pub use mocks::{
    ScriptedAniList, ScriptedChannel, ScriptedTmdb, SentCommands, StaticMappingFeed,
    StaticTitleSource,
};
