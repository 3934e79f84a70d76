//! Content API client
//!
//! HTTP implementation of [`VerseSource`]. Verse keys are looked up through
//! `/verses/by_key/{key}` and sequential ids through `/verses/by_id/{id}`;
//! chapters come from `/chapters`.

use crate::fetch::{FetchError, VerseSource};
use crate::identifier::{is_verse_id, is_verse_key};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tilawa_common::{Chapter, Translation, Verse};

const USER_AGENT: &str = concat!("Tilawa/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct VerseEnvelope {
    verse: ApiVerse,
}

#[derive(Debug, Deserialize)]
struct ApiVerse {
    id: i64,
    verse_key: String,
    #[serde(default)]
    text_uthmani: Option<String>,
    #[serde(default)]
    translations: Vec<ApiTranslation>,
}

#[derive(Debug, Deserialize)]
struct ApiTranslation {
    #[serde(default)]
    resource_id: i64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ChaptersEnvelope {
    chapters: Vec<ApiChapter>,
}

#[derive(Debug, Deserialize)]
struct ApiChapter {
    id: u32,
    verses_count: i64,
    #[serde(default)]
    name_simple: String,
    #[serde(default)]
    name_arabic: String,
}

impl From<ApiVerse> for Verse {
    fn from(v: ApiVerse) -> Self {
        Verse {
            id: v.id,
            verse_key: v.verse_key,
            text_uthmani: v.text_uthmani.unwrap_or_default(),
            translations: v
                .translations
                .into_iter()
                .map(|t| Translation {
                    resource_id: t.resource_id,
                    text: t.text,
                })
                .collect(),
        }
    }
}

impl From<ApiChapter> for Chapter {
    fn from(c: ApiChapter) -> Self {
        Chapter {
            id: c.id,
            verses_count: c.verses_count,
            name_simple: c.name_simple,
            name_arabic: c.name_arabic,
        }
    }
}

/// Remote content API client
pub struct ContentApiClient {
    http_client: reqwest::Client,
    base_url: String,
    translation_id: i64,
}

impl ContentApiClient {
    pub fn new(base_url: &str, translation_id: i64) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            translation_id,
        })
    }

    /// Request URL for a verse identifier
    pub fn verse_url(&self, identifier: &str) -> Result<String, FetchError> {
        let identifier = identifier.trim();
        let path = if is_verse_key(identifier) {
            format!("verses/by_key/{}", identifier)
        } else if is_verse_id(identifier) {
            format!("verses/by_id/{}", identifier)
        } else {
            return Err(FetchError::InvalidIdentifier(identifier.to_string()));
        };

        Ok(format!(
            "{}/{}?translations={}&fields=text_uthmani",
            self.base_url, path, self.translation_id
        ))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> Result<T, FetchError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::VerseNotFound(what.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl VerseSource for ContentApiClient {
    async fn fetch_verse(&self, identifier: &str) -> Result<Verse, FetchError> {
        let url = self.verse_url(identifier)?;
        tracing::debug!(identifier = %identifier, url = %url, "Querying content API");

        let envelope: VerseEnvelope = self.get_json(&url, identifier).await?;
        let verse = Verse::from(envelope.verse);

        tracing::info!(
            identifier = %identifier,
            verse_key = %verse.verse_key,
            verse_id = verse.id,
            "Retrieved verse from content API"
        );

        Ok(verse)
    }

    async fn fetch_chapters(&self) -> Result<Vec<Chapter>, FetchError> {
        let url = format!("{}/chapters", self.base_url);
        let envelope: ChaptersEnvelope = self.get_json(&url, "chapters").await?;
        Ok(envelope.chapters.into_iter().map(Chapter::from).collect())
    }
}
