//! FILE lookup by size and ED2K digest
//!
//! The parsed [`FileRecord`] is cached as TOML under the metadata directory,
//! keyed by the ED2K digest, and is the data source for rename templates.

use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::messages::AniDBCommand;
use serde::{Deserialize, Serialize};

/// File fields: aid eid gid lid state, size ed2k md5 sha1 crc32,
/// quality source audio video resolution filetype, dub sub length
/// description and the anidb filename
pub const FILE_FMASK: &str = "79F8FFF100";

/// Anime fields: episode counts, year, type, categories, every title list,
/// episode number and names, group name and short name
pub const FILE_AMASK: &str = "F2FCF0C0";

/// Number of fields a FILE reply carries for the masks above, fid included
pub const FILE_FIELD_COUNT: usize = 41;

const LIST_SEPARATOR: char = '\'';

/// File state bits reported by AniDB
pub mod state {
    pub const CRC_OK: u16 = 0x01;
    pub const CRC_ERR: u16 = 0x02;
    pub const ISV2: u16 = 0x04;
    pub const ISV3: u16 = 0x08;
    pub const ISV4: u16 = 0x10;
    pub const ISV5: u16 = 0x20;
    pub const UNC: u16 = 0x40;
    pub const CEN: u16 = 0x80;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRecord {
    pub fid: u64,
    pub aid: u64,
    pub eid: u64,
    pub gid: u64,
    pub lid: u64,
    pub state: u16,
    pub size: u64,
    pub ed2k: String,
    pub md5: String,
    pub sha1: String,
    pub crc32: String,
    pub quality: String,
    pub source: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub video_codec: String,
    pub video_bitrate: String,
    pub resolution: String,
    pub filetype: String,
    pub lang_dub: String,
    pub lang_sub: String,
    pub length: String,
    pub description: String,
    pub original_name: String,
    pub episode_total: String,
    pub episode_last: String,
    /// `YYYY` or `YYYY-YYYY`
    pub anime_year: String,
    pub anime_type: String,
    pub anime_category: Vec<String>,
    pub anime_name_romaji: String,
    pub anime_name_kanji: String,
    pub anime_name_english: String,
    pub anime_name_other: Vec<String>,
    pub anime_name_short: Vec<String>,
    pub anime_synonyms: Vec<String>,
    pub episode: String,
    pub episode_name: String,
    pub episode_name_romaji: String,
    pub episode_name_kanji: String,
    pub group: String,
    pub group_short: String,
}

impl FileRecord {
    /// Release version derived from the state bits, empty for v1
    pub fn version(&self) -> &'static str {
        [
            (state::ISV5, "v5"),
            (state::ISV4, "v4"),
            (state::ISV3, "v3"),
            (state::ISV2, "v2"),
        ]
        .into_iter()
        .find(|(bit, _)| self.state & bit != 0)
        .map_or("", |(_, version)| version)
    }

    /// `unc` or `cen` from the state bits; uncensored wins when both are set
    pub fn censored(&self) -> &'static str {
        if self.state & state::UNC != 0 {
            "unc"
        } else if self.state & state::CEN != 0 {
            "cen"
        } else {
            ""
        }
    }

    /// Start and end year of the anime
    pub fn anime_years(&self) -> Vec<String> {
        self.anime_year
            .split('-')
            .map(str::trim)
            .filter(|year| !year.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Fill integrity checksums the server left empty
    pub fn backfill(&mut self, crc32: &str, md5: &str, sha1: &str) {
        for (field, value) in [
            (&mut self.crc32, crc32),
            (&mut self.md5, md5),
            (&mut self.sha1, sha1),
        ] {
            if field.is_empty() {
                *field = value.to_string();
            }
        }
    }

    /// Whether any integrity checksum is missing
    pub fn missing_checksums(&self) -> bool {
        self.crc32.is_empty() || self.md5.is_empty() || self.sha1.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FileCommand {
    pub size: u64,
    pub ed2k: String,
    pub fmask: String,
    pub amask: String,
}

impl FileCommand {
    pub fn by_hash(size: u64, ed2k: impl Into<String>) -> Self {
        Self {
            size,
            ed2k: ed2k.into(),
            fmask: FILE_FMASK.to_string(),
            amask: FILE_AMASK.to_string(),
        }
    }
}

impl AniDBCommand for FileCommand {
    fn name(&self) -> &'static str {
        "FILE"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("size", self.size.to_string()),
            ("ed2k", self.ed2k.clone()),
            ("fmask", self.fmask.clone()),
            ("amask", self.amask.clone()),
        ]
    }
}

/// Build a [`FileRecord`] from the data line of a `220 FILE` reply
pub fn parse_file_record(fields: &[String]) -> Result<FileRecord> {
    if fields.len() < FILE_FIELD_COUNT {
        return Err(ProtocolError::invalid_response(
            format!("{FILE_FIELD_COUNT} FILE fields"),
            format!("{} fields", fields.len()),
        ));
    }

    let text = |index: usize| fields[index].clone();
    let list = |index: usize, separator: char| -> Vec<String> {
        fields[index]
            .split(separator)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    };

    Ok(FileRecord {
        fid: number(&fields[0], "fid")?,
        aid: number(&fields[1], "aid")?,
        eid: number(&fields[2], "eid")?,
        gid: number(&fields[3], "gid")?,
        lid: number(&fields[4], "lid")?,
        state: number(&fields[5], "state")?,
        size: number(&fields[6], "size")?,
        ed2k: text(7),
        md5: text(8),
        sha1: text(9),
        crc32: text(10),
        quality: text(11),
        source: text(12),
        audio_codec: text(13),
        audio_bitrate: text(14),
        video_codec: text(15),
        video_bitrate: text(16),
        resolution: text(17),
        filetype: text(18),
        lang_dub: text(19),
        lang_sub: text(20),
        length: text(21),
        description: text(22),
        original_name: text(23),
        episode_total: text(24),
        episode_last: text(25),
        anime_year: text(26),
        anime_type: text(27),
        anime_category: list(28, ','),
        anime_name_romaji: text(29),
        anime_name_kanji: text(30),
        anime_name_english: text(31),
        anime_name_other: list(32, LIST_SEPARATOR),
        anime_name_short: list(33, LIST_SEPARATOR),
        anime_synonyms: list(34, LIST_SEPARATOR),
        episode: text(35),
        episode_name: text(36),
        episode_name_romaji: text(37),
        episode_name_kanji: text(38),
        group: text(39),
        group_short: text(40),
    })
}

fn number<T>(value: &str, field: &str) -> Result<T>
where
    T: std::str::FromStr + Default,
{
    if value.is_empty() {
        return Ok(T::default());
    }
    value
        .parse()
        .map_err(|_| ProtocolError::decoding(format!("invalid {field}: {value}")))
}
