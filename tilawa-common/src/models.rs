//! Bookmark, chapter and verse models
//!
//! JSON field names follow the camelCase convention of the persisted bookmark
//! records and the browser UI.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A chapter (surah) of the Quran with its verse count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Chapter number, 1..=114
    pub id: u32,
    /// Number of verses; chapters with a non-positive count are ignored by inference
    pub verses_count: i64,
    #[serde(default)]
    pub name_simple: String,
    #[serde(default)]
    pub name_arabic: String,
}

impl Chapter {
    pub fn new(id: u32, verses_count: i64, name_simple: impl Into<String>) -> Self {
        Self {
            id,
            verses_count,
            name_simple: name_simple.into(),
            name_arabic: String::new(),
        }
    }
}

/// Sort a chapter list ascending by id.
///
/// Sequential-id inference assumes this order and never re-sorts on its own,
/// so callers run this once when the list is loaded.
pub fn sort_chapters(mut chapters: Vec<Chapter>) -> Vec<Chapter> {
    chapters.sort_by_key(|c| c.id);
    chapters
}

/// One translation of a verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub resource_id: i64,
    pub text: String,
}

/// Authoritative verse content, as returned by the content API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    /// Sequential verse id assigned by the content API
    pub id: i64,
    pub verse_key: String,
    pub text_uthmani: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<Translation>,
}

/// Which bookmark field produced the canonical identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierSource {
    VerseId,
    VerseKey,
    VerseApiId,
}

/// A persisted bookmark record.
///
/// Any of the three identifier fields may be missing or malformed. Fields
/// this crate does not know about are kept in `extra` so a whole-record
/// replace never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub verse_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub verse_key: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub verse_api_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surah_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identifier text stored as either a JSON string or number; anything else
/// reads as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Integer stored as a JSON number or a numeric string; anything else reads
/// as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl Bookmark {
    /// Produce the full replacement record for `patch` applied to `self`.
    pub fn apply_patch(&self, patch: &BookmarkPatch) -> Bookmark {
        let mut next = self.clone();
        if let Some(verse_id) = &patch.verse_id {
            next.verse_id = Some(verse_id.clone());
        }
        if let Some(verse_key) = &patch.verse_key {
            next.verse_key = Some(verse_key.clone());
        }
        if let Some(verse_api_id) = patch.verse_api_id {
            next.verse_api_id = Some(verse_api_id);
        }
        if let Some(verse_text) = &patch.verse_text {
            next.verse_text = Some(verse_text.clone());
        }
        if let Some(translation) = &patch.translation {
            next.translation = Some(translation.clone());
        }
        if let Some(surah_name) = &patch.surah_name {
            next.surah_name = Some(surah_name.clone());
        }
        next
    }
}

/// Partial bookmark used for corrective writes. Absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_api_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surah_name: Option<String>,
}

impl BookmarkPatch {
    pub fn is_empty(&self) -> bool {
        *self == BookmarkPatch::default()
    }
}
