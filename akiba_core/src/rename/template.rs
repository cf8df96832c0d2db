//! Rename templates
//!
//! A template is plain text with `{tag}` or `{tag:modifier}` placeholders.
//! Tags and modifiers are resolved when the template is compiled, so a bad
//! format is rejected before any file is touched.

use crate::episodes::strip_zeros;
use crate::error::TemplateError;
use crate::protocol::messages::FileRecord;
use crate::rename::sanitize::escape_separators;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const DEFAULT_FORMAT: &str =
    "{anime_name_romaji}/{anime_name_romaji} - {episode} - {episode_name} ({crc32}).{filetype}";

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{(\w+)(?::(\w+))?\}").ok());

macro_rules! tags {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Known template tags
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Tag {
            $($variant),+
        }

        impl Tag {
            pub const ALL: &'static [Tag] = &[$(Tag::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Tag::$variant => $name),+
                }
            }
        }
    };
}

tags! {
    Fid => "fid",
    Aid => "aid",
    Eid => "eid",
    Gid => "gid",
    Lid => "lid",
    Status => "status",
    Size => "size",
    Ed2k => "ed2k",
    Md5 => "md5",
    Sha1 => "sha1",
    Crc32 => "crc32",
    LangDub => "lang_dub",
    LangSub => "lang_sub",
    Quality => "quality",
    Source => "source",
    AudioCodec => "audio_codec",
    AudioBitrate => "audio_bitrate",
    VideoCodec => "video_codec",
    VideoBitrate => "video_bitrate",
    Resolution => "resolution",
    Filetype => "filetype",
    Length => "length",
    Description => "description",
    Group => "group",
    GroupShort => "group_short",
    Episode => "episode",
    EpisodeName => "episode_name",
    EpisodeNameRomaji => "episode_name_romaji",
    EpisodeNameKanji => "episode_name_kanji",
    EpisodeTotal => "episode_total",
    EpisodeLast => "episode_last",
    AnimeYear => "anime_year",
    AnimeType => "anime_type",
    AnimeNameRomaji => "anime_name_romaji",
    AnimeNameKanji => "anime_name_kanji",
    AnimeNameEnglish => "anime_name_english",
    AnimeNameOther => "anime_name_other",
    AnimeNameShort => "anime_name_short",
    AnimeSynonyms => "anime_synonyms",
    AnimeCategory => "anime_category",
    Version => "version",
    Censored => "censored",
    OriginalName => "original_name",
}

impl Tag {
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|tag| tag.name()).collect()
    }

    /// Value of the tag in `record`
    pub fn value(self, record: &FileRecord) -> TagValue {
        use Tag::*;

        let text = |value: &str| TagValue::Text(value.to_string());
        match self {
            Fid => TagValue::Text(record.fid.to_string()),
            Aid => TagValue::Text(record.aid.to_string()),
            Eid => TagValue::Text(record.eid.to_string()),
            Gid => TagValue::Text(record.gid.to_string()),
            Lid => TagValue::Text(record.lid.to_string()),
            Status => TagValue::Text(record.state.to_string()),
            Size => TagValue::Text(record.size.to_string()),
            Ed2k => text(&record.ed2k),
            Md5 => text(&record.md5),
            Sha1 => text(&record.sha1),
            Crc32 => text(&record.crc32),
            LangDub => text(&record.lang_dub),
            LangSub => text(&record.lang_sub),
            Quality => text(&record.quality),
            Source => text(&record.source),
            AudioCodec => text(&record.audio_codec),
            AudioBitrate => text(&record.audio_bitrate),
            VideoCodec => text(&record.video_codec),
            VideoBitrate => text(&record.video_bitrate),
            Resolution => text(&record.resolution),
            Filetype => text(&record.filetype),
            Length => text(&record.length),
            Description => text(&record.description),
            Group => text(&record.group),
            GroupShort => text(&record.group_short),
            Episode => text(&record.episode),
            EpisodeName => text(&record.episode_name),
            EpisodeNameRomaji => text(&record.episode_name_romaji),
            EpisodeNameKanji => text(&record.episode_name_kanji),
            EpisodeTotal => text(&record.episode_total),
            EpisodeLast => text(&record.episode_last),
            AnimeYear => TagValue::List(record.anime_years()),
            AnimeType => text(&record.anime_type),
            AnimeNameRomaji => text(&record.anime_name_romaji),
            AnimeNameKanji => text(&record.anime_name_kanji),
            AnimeNameEnglish => text(&record.anime_name_english),
            AnimeNameOther => TagValue::List(record.anime_name_other.clone()),
            AnimeNameShort => TagValue::List(record.anime_name_short.clone()),
            AnimeSynonyms => TagValue::List(record.anime_synonyms.clone()),
            AnimeCategory => TagValue::List(record.anime_category.clone()),
            Version => text(record.version()),
            Censored => text(record.censored()),
            OriginalName => text(&record.original_name),
        }
    }
}

impl FromStr for Tag {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Tag::AnimeNameRomaji),
            "title" => Ok(Tag::EpisodeName),
            _ => Self::ALL
                .iter()
                .copied()
                .find(|tag| tag.name() == s)
                .ok_or_else(|| TemplateError::unknown_tag(s)),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tag value, either a single string or a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Text(String),
    List(Vec<String>),
}

impl TagValue {
    fn joined(&self) -> String {
        match self {
            TagValue::Text(text) => text.clone(),
            TagValue::List(items) => items.join(","),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Upper,
    Lower,
    UpperFirst,
    LowerFirst,
    /// Strip zero padding, on both sides of a range
    Number,
    /// Element of a list value
    Index(usize),
}

impl Modifier {
    fn parse(tag: &str, modifier: &str) -> Result<Self, TemplateError> {
        match modifier.to_lowercase().as_str() {
            "upper" => Ok(Modifier::Upper),
            "lower" => Ok(Modifier::Lower),
            "upper_first" => Ok(Modifier::UpperFirst),
            "lower_first" => Ok(Modifier::LowerFirst),
            "number" => Ok(Modifier::Number),
            other => other
                .parse::<usize>()
                .map(Modifier::Index)
                .map_err(|_| TemplateError::unknown_modifier(tag, modifier)),
        }
    }

    fn apply(self, value: TagValue) -> String {
        match (self, value) {
            (Modifier::Upper, value) => value.joined().to_uppercase(),
            (Modifier::Lower, value) => value.joined().to_lowercase(),
            (Modifier::UpperFirst, value) => first_char(&value.joined().to_uppercase()),
            (Modifier::LowerFirst, value) => first_char(&value.joined().to_lowercase()),
            (Modifier::Number, TagValue::Text(text)) => text
                .split('-')
                .map(|part| strip_zeros(part.trim()))
                .collect::<Vec<_>>()
                .join("-"),
            (Modifier::Index(index), TagValue::List(items)) => match items.get(index) {
                Some(item) => item.clone(),
                None => items.join(","),
            },
            (_, value) => value.joined(),
        }
    }
}

fn first_char(text: &str) -> String {
    text.chars().next().map(String::from).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder { tag: Tag, modifier: Option<Modifier> },
}

/// A validated rename template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let Some(placeholder) = PLACEHOLDER.as_ref() else {
            return Ok(Self {
                source: source.to_string(),
                segments: vec![Segment::Literal(source.to_string())],
            });
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for captures in placeholder.captures_iter(source) {
            let (Some(whole), Some(tag)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            let modifier = captures
                .get(2)
                .map(|m| Modifier::parse(tag.as_str(), m.as_str()))
                .transpose()?;
            segments.push(Segment::Placeholder {
                tag: tag.as_str().parse()?,
                modifier,
            });
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the template; path separators inside values are escaped so
    /// only the template's own `/` create directories
    pub fn render(&self, record: &FileRecord) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Placeholder { tag, modifier } => {
                    let value = tag.value(record);
                    let rendered = match (modifier, value) {
                        (Some(modifier), value) => modifier.apply(value),
                        (None, TagValue::List(items)) => {
                            items.into_iter().next().unwrap_or_default()
                        }
                        (None, TagValue::Text(text)) => text,
                    };
                    escape_separators(&rendered)
                }
            })
            .collect()
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::compile(DEFAULT_FORMAT).unwrap_or_else(|_| Self {
            source: DEFAULT_FORMAT.to_string(),
            segments: vec![Segment::Literal(DEFAULT_FORMAT.to_string())],
        })
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FileRecord {
        FileRecord {
            anime_name_romaji: "Foo".to_string(),
            episode: "013".to_string(),
            episode_name: "Bar".to_string(),
            filetype: "mkv".to_string(),
            crc32: "a1b2c3d4".to_string(),
            anime_year: "1998-1999".to_string(),
            anime_synonyms: vec!["One".to_string(), "Two".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_aliases_and_number_modifier() {
        let template = Template::compile("{name}/{name} - {episode:number} - {title}.{filetype}")
            .unwrap();
        assert_eq!(template.render(&record()), "Foo/Foo - 13 - Bar.mkv");
    }

    #[test]
    fn test_default_format() {
        let template = Template::default();
        assert_eq!(template.source(), DEFAULT_FORMAT);
        assert_eq!(
            template.render(&record()),
            "Foo/Foo - 013 - Bar (a1b2c3d4).mkv"
        );
    }

    #[test]
    fn test_case_modifiers() {
        let template =
            Template::compile("{name:upper} {name:lower} {title:upper_first}{title:lower_first}")
                .unwrap();
        assert_eq!(template.render(&record()), "FOO foo Bb");
    }

    #[test]
    fn test_number_on_range() {
        let mut record = record();
        record.episode = "01-03".to_string();
        let template = Template::compile("{episode:number}").unwrap();
        assert_eq!(template.render(&record), "1-3");

        record.episode = "S02".to_string();
        assert_eq!(template.render(&record), "S2");
    }

    #[test]
    fn test_list_values() {
        let template =
            Template::compile("{anime_year} {anime_year:1} {anime_synonyms:5} {anime_synonyms}")
                .unwrap();
        assert_eq!(template.render(&record()), "1998 1999 One,Two One");
    }

    #[test]
    fn test_empty_list_renders_nothing() {
        let template = Template::compile("[{anime_name_other}]").unwrap();
        assert_eq!(template.render(&record()), "[]");
    }

    #[test]
    fn test_unknown_tag_rejected_at_compile() {
        let error = Template::compile("{name} - {bogus}").unwrap_err();
        assert!(matches!(error, TemplateError::UnknownTag { ref tag, .. } if tag == "bogus"));
    }

    #[test]
    fn test_unknown_modifier_rejected_at_compile() {
        let error = Template::compile("{episode:shout}").unwrap_err();
        assert!(matches!(error, TemplateError::UnknownModifier { .. }));
    }

    #[test]
    fn test_separators_in_values_are_escaped() {
        let mut record = record();
        record.anime_name_romaji = "Fate/Zero".to_string();
        let template = Template::compile("{name}/{episode}").unwrap();
        assert_eq!(template.render(&record), "Fate_Zero/013");
    }

    #[test]
    fn test_text_without_placeholders() {
        let template = Template::compile("plain {not a tag}").unwrap();
        assert_eq!(template.render(&record()), "plain {not a tag}");
    }

    #[test]
    fn test_every_tag_name_parses() {
        for name in Tag::names() {
            assert_eq!(name.parse::<Tag>().unwrap().name(), name);
        }
        assert_eq!(Tag::ALL.len(), 43);
    }
}
