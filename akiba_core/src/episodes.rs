//! Episode filename parsing for already renamed anime directories

use crate::Result;
use crate::error::io;
use crate::matching::natural_cmp;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extensions treated as episode files
pub const EPISODE_EXTENSIONS: [&str; 6] = ["mkv", "mp4", "avi", "ogm", "webm", "m4v"];

static SINGLE_EPISODE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\s-\s(?<episode>(S|C|T|P|O|E)?\d+)\s-\s(?<title>.+)\.\w{3}").ok()
});
static MULTI_EPISODE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\s-\s(?<episode>(S|C|T|P|O)?\d+-(S|C|T|P|O)?\d+)\s-\s(?<title>.+)\.\w{3}").ok()
});
static CRC32_SUFFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r".+(?<crc32>\([A-Za-z0-9]{8}\))").ok());

/// Episode file parsed from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeFile {
    pub path: PathBuf,
    /// First episode, kept as text so specials like `S1` survive
    pub episode_start: String,
    /// Last episode, equal to `episode_start` for single episode files
    pub episode_end: String,
    pub title: String,
}

impl EpisodeFile {
    pub fn is_multi_episode(&self) -> bool {
        self.episode_start != self.episode_end
    }
}

/// Whether `path` carries one of the [`EPISODE_EXTENSIONS`]
pub fn is_episode_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EPISODE_EXTENSIONS.contains(&ext))
}

/// Parse a filename of the shape `<show> - <ep> - <title>.<ext>`
///
/// Ranges such as `01-02` produce a multi episode file. A trailing
/// `(CRC32)` is dropped from the title.
pub fn parse_episode(path: &Path) -> Option<EpisodeFile> {
    let name = path.file_name()?.to_str()?;

    let (episodes, title): (Vec<String>, &str) =
        if let Some(caps) = SINGLE_EPISODE.as_ref()?.captures(name) {
            (vec![strip_zeros(&caps["episode"])], caps.name("title")?.as_str())
        } else {
            let caps = MULTI_EPISODE.as_ref()?.captures(name)?;
            (
                caps["episode"].split('-').map(strip_zeros).collect(),
                caps.name("title")?.as_str(),
            )
        };

    let title = match CRC32_SUFFIX
        .as_ref()
        .and_then(|re| re.captures(title))
        .and_then(|caps| caps.name("crc32"))
    {
        Some(crc) => title.replacen(crc.as_str(), "", 1),
        None => title.to_string(),
    };

    Some(EpisodeFile {
        path: path.to_path_buf(),
        episode_start: episodes.first()?.clone(),
        episode_end: episodes.last()?.clone(),
        title: title.trim().to_string(),
    })
}

/// Parse every episode file directly inside `dir`, in natural order
///
/// A missing path or a path that is not a directory yields no episodes.
/// Files whose names do not parse are skipped.
pub async fn episodes(dir: &Path) -> Result<Vec<EpisodeFile>> {
    if !tokio::fs::metadata(dir).await.is_ok_and(|m| m.is_dir()) {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    let mut reader = tokio::fs::read_dir(dir).await.map_err(io::at(dir))?;
    while let Some(entry) = reader.next_entry().await.map_err(io::at(dir))? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort_by(|a, b| natural_cmp(a, b));

    Ok(names
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| is_episode_file(path))
        .filter_map(|path| parse_episode(&path))
        .collect())
}

/// Drop zero padding while keeping a special-episode prefix
pub(crate) fn strip_zeros(episode: &str) -> String {
    let digits_at = episode
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(episode.len());
    let (prefix, number) = episode.split_at(digits_at);
    let trimmed = number.trim_start_matches('0');
    if trimmed.is_empty() && !number.is_empty() {
        format!("{prefix}0")
    } else {
        format!("{prefix}{trimmed}")
    }
}
