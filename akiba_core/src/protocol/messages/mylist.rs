//! MYLIST lookup and MYLISTADD for list membership sync

use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::messages::AniDBCommand;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index of the state column in a `221 MYLIST` data line
///
/// lid|fid|eid|aid|gid|date|state|viewdate|storage|source|other|filestate
const MYLIST_STATE_FIELD: usize = 6;

/// Storage state of a list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MylistState {
    Unknown = 0,
    InternalStorage = 1,
    ExternalStorage = 2,
    Deleted = 3,
    RemoteStorage = 4,
}

impl MylistState {
    pub const ALL: [MylistState; 5] = [
        Self::Unknown,
        Self::InternalStorage,
        Self::ExternalStorage,
        Self::Deleted,
        Self::RemoteStorage,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::InternalStorage => "internal_storage",
            Self::ExternalStorage => "external_storage",
            Self::Deleted => "deleted",
            Self::RemoteStorage => "remote_storage",
        }
    }

    /// Read the state out of a `221 MYLIST` data line
    pub fn from_fields(fields: &[String]) -> Result<Self> {
        let value = fields
            .get(MYLIST_STATE_FIELD)
            .ok_or_else(|| ProtocolError::missing_field("state"))?;
        let code = value
            .parse::<u8>()
            .map_err(|_| ProtocolError::decoding(format!("invalid mylist state: {value}")))?;
        Self::try_from(code)
    }
}

impl TryFrom<u8> for MylistState {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.code() == code)
            .ok_or_else(|| ProtocolError::decoding(format!("unknown mylist state: {code}")))
    }
}

impl FromStr for MylistState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|state| state.as_str()).collect();
                format!("unknown mylist state '{s}', expected one of: {}", names.join(", "))
            })
    }
}

impl fmt::Display for MylistState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MYLIST lookup of a single file by size and ED2K digest
#[derive(Debug, Clone)]
pub struct MyListCommand {
    pub size: u64,
    pub ed2k: String,
}

impl MyListCommand {
    pub fn by_hash(size: u64, ed2k: impl Into<String>) -> Self {
        Self {
            size,
            ed2k: ed2k.into(),
        }
    }
}

impl AniDBCommand for MyListCommand {
    fn name(&self) -> &'static str {
        "MYLIST"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("size", self.size.to_string()), ("ed2k", self.ed2k.clone())]
    }
}

/// MYLISTADD, either creating an entry or editing it when `edit` is set
#[derive(Debug, Clone)]
pub struct MyListAddCommand {
    pub size: u64,
    pub ed2k: String,
    pub state: MylistState,
    pub edit: bool,
}

impl MyListAddCommand {
    pub fn by_hash(size: u64, ed2k: impl Into<String>, state: MylistState) -> Self {
        Self {
            size,
            ed2k: ed2k.into(),
            state,
            edit: false,
        }
    }

    pub fn with_edit(mut self, edit: bool) -> Self {
        self.edit = edit;
        self
    }
}

impl AniDBCommand for MyListAddCommand {
    fn name(&self) -> &'static str {
        "MYLISTADD"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("size", self.size.to_string()),
            ("ed2k", self.ed2k.clone()),
            ("state", self.state.code().to_string()),
            ("edit", u8::from(self.edit).to_string()),
        ]
    }
}
