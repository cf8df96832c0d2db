//! Title corpus download and parsing

use crate::Result;
use crate::anime::{TitleKind, TitleVariant};
use crate::error::RemoteError;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use log::{debug, info};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// Public daily dump of every anime title
pub const TITLES_URL: &str = "https://anidb.net/api/anime-titles.xml.gz";

const SERVICE: &str = "anime-titles";

/// Titles grouped by primary id
pub type TitleMap = BTreeMap<u64, Vec<TitleVariant>>;

/// Where the full title corpus comes from
#[async_trait]
pub trait TitleSource: Send + Sync {
    async fn fetch(&self) -> Result<TitleMap>;
}

/// Downloads the gzip compressed XML title dump over HTTPS
pub struct HttpTitleSource {
    client: reqwest::Client,
    url: String,
}

impl HttpTitleSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_url(client, TITLES_URL)
    }

    pub fn with_url(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TitleSource for HttpTitleSource {
    async fn fetch(&self) -> Result<TitleMap> {
        info!("Downloading title corpus from {}", self.url);

        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| RemoteError::from_reqwest(SERVICE, e))?
            .bytes()
            .await
            .map_err(|e| RemoteError::from_reqwest(SERVICE, e))?;

        let xml = gunzip(&body)?;
        parse_corpus(&xml)
    }
}

/// Inflate a gzip payload into text
pub fn gunzip(data: &[u8]) -> Result<String> {
    let mut xml = String::new();
    GzDecoder::new(data)
        .read_to_string(&mut xml)
        .map_err(|e| RemoteError::decode(SERVICE, e.to_string()))?;
    Ok(xml)
}

#[derive(Debug, Deserialize)]
struct Corpus {
    #[serde(rename = "anime", default)]
    anime: Vec<CorpusAnime>,
}

#[derive(Debug, Deserialize)]
struct CorpusAnime {
    #[serde(rename = "@aid")]
    aid: u64,
    #[serde(rename = "title", default)]
    titles: Vec<CorpusTitle>,
}

#[derive(Debug, Deserialize)]
struct CorpusTitle {
    #[serde(rename = "@type")]
    kind: String,
    #[serde(rename = "@xml:lang")]
    language: String,
    #[serde(rename = "$text", default)]
    text: String,
}

/// Parse the title dump, keeping only main and official titles
///
/// Every anime appears in the result, even when none of its titles survive
/// the filter.
pub fn parse_corpus(xml: &str) -> Result<TitleMap> {
    let corpus: Corpus =
        quick_xml::de::from_str(xml).map_err(|e| RemoteError::decode(SERVICE, e.to_string()))?;

    let mut titles = TitleMap::new();
    for anime in corpus.anime {
        let variants = titles.entry(anime.aid).or_default();
        for title in anime.titles {
            let kind = TitleKind::from(title.kind);
            if !matches!(kind, TitleKind::Main | TitleKind::Official) {
                continue;
            }
            variants.push(TitleVariant::new(
                html_escape::decode_html_entities(&title.text),
                kind,
                title.language,
            ));
        }
    }

    debug!("Parsed titles for {} anime", titles.len());
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<animetitles>
  <anime aid="1">
    <title xml:lang="x-jat" type="main">Seikai no Monshou</title>
    <title xml:lang="en" type="official">Crest of the Stars</title>
    <title xml:lang="ja" type="official">星界の紋章</title>
    <title xml:lang="en" type="synonym">CotS</title>
    <title xml:lang="x-jat" type="short">SnM</title>
  </anime>
  <anime aid="22">
    <title xml:lang="x-jat" type="main">Tom &amp;amp; Jerry</title>
  </anime>
</animetitles>"#;

    #[test]
    fn test_parse_corpus_keeps_main_and_official() {
        let titles = parse_corpus(SAMPLE).unwrap();
        let first = &titles[&1];

        assert_eq!(first.len(), 3);
        assert_eq!(first[0].title, "Seikai no Monshou");
        assert_eq!(first[0].kind, TitleKind::Main);
        assert_eq!(first[0].language, "x-jat");
        assert!(first[2].is(&TitleKind::Official, "ja"));
    }

    #[test]
    fn test_parse_corpus_decodes_entities() {
        let titles = parse_corpus(SAMPLE).unwrap();
        assert_eq!(titles[&22][0].title, "Tom & Jerry");
    }

    #[test]
    fn test_gunzip_round_trip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(gunzip(&compressed).unwrap(), SAMPLE);
        assert!(gunzip(b"plain text").is_err());
    }
}
