//! Mock implementations for testing

mod channel;
mod providers;

pub use channel::{ScriptedChannel, SentCommands};
pub use providers::{ScriptedAniList, ScriptedTmdb, StaticMappingFeed, StaticTitleSource};
