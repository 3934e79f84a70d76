//! Identifier model
//!
//! A bookmark can point at its verse through three fields: `verseId`,
//! `verseKey` and `verseApiId`. Any of them may be missing or malformed in
//! stored data, so every function here degrades to `None` instead of failing.
//!
//! Accepted shapes:
//! - verse id: `^\d+$` (after trimming)
//! - verse key: `^\d+:\d+(-\d+)?$`, e.g. `2:255` or the range `2:255-257`

use std::fmt;
use tilawa_common::{Bookmark, IdentifierSource};

/// Raw identifier value as found on a stored bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawIdentifier<'a> {
    Text(&'a str),
    Number(i64),
    Absent,
}

impl<'a> From<&'a str> for RawIdentifier<'a> {
    fn from(value: &'a str) -> Self {
        RawIdentifier::Text(value)
    }
}

impl<'a> From<&'a String> for RawIdentifier<'a> {
    fn from(value: &'a String) -> Self {
        RawIdentifier::Text(value.as_str())
    }
}

impl From<i64> for RawIdentifier<'_> {
    fn from(value: i64) -> Self {
        RawIdentifier::Number(value)
    }
}

impl<'a> From<Option<&'a str>> for RawIdentifier<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(RawIdentifier::Absent, RawIdentifier::Text)
    }
}

impl<'a> From<&'a Option<String>> for RawIdentifier<'a> {
    fn from(value: &'a Option<String>) -> Self {
        value.as_deref().into()
    }
}

impl From<Option<i64>> for RawIdentifier<'_> {
    fn from(value: Option<i64>) -> Self {
        value.map_or(RawIdentifier::Absent, RawIdentifier::Number)
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Check if a string matches `^\d+$`.
pub fn is_verse_id(s: &str) -> bool {
    is_digits(s)
}

/// Check if a string matches `^\d+:\d+(-\d+)?$`.
pub fn is_verse_key(s: &str) -> bool {
    let Some((surah, ayah)) = s.split_once(':') else {
        return false;
    };
    if !is_digits(surah) {
        return false;
    }
    match ayah.split_once('-') {
        Some((start, end)) => is_digits(start) && is_digits(end),
        None => is_digits(ayah),
    }
}

/// Trim and stringify `value`, keeping it only if it is a verse id or verse key.
pub fn normalize_identifier<'a>(value: impl Into<RawIdentifier<'a>>) -> Option<String> {
    let text = match value.into() {
        RawIdentifier::Text(s) => s.trim().to_string(),
        RawIdentifier::Number(n) => n.to_string(),
        RawIdentifier::Absent => return None,
    };

    if is_verse_id(&text) || is_verse_key(&text) {
        Some(text)
    } else {
        None
    }
}

/// Canonical identifier of a bookmark, tagged with the field it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Identifier {
    /// From `verseId`
    Id(String),
    /// From `verseKey`
    Key(String),
    /// From `verseApiId`, in string form
    ApiId(String),
    /// No field held a usable identifier
    #[default]
    None,
}

impl Identifier {
    /// Identifier text; empty for [`Identifier::None`].
    pub fn as_str(&self) -> &str {
        match self {
            Identifier::Id(s) | Identifier::Key(s) | Identifier::ApiId(s) => s,
            Identifier::None => "",
        }
    }

    pub fn source(&self) -> Option<IdentifierSource> {
        match self {
            Identifier::Id(_) => Some(IdentifierSource::VerseId),
            Identifier::Key(_) => Some(IdentifierSource::VerseKey),
            Identifier::ApiId(_) => Some(IdentifierSource::VerseApiId),
            Identifier::None => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Identifier::None)
    }

    /// Whether the identifier text itself is a verse key.
    ///
    /// A `verseId` may hold a key once a previous pass has normalized it.
    pub fn is_verse_key(&self) -> bool {
        is_verse_key(self.as_str())
    }

    /// The identifier text, or `None` when empty.
    pub fn value(&self) -> Option<&str> {
        match self {
            Identifier::None => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the canonical identifier of `bookmark`.
///
/// Priority is fixed: `verseId`, then `verseKey`, then `verseApiId`.
pub fn derive_identifier(bookmark: &Bookmark) -> Identifier {
    if let Some(id) = normalize_identifier(&bookmark.verse_id) {
        return Identifier::Id(id);
    }
    if let Some(key) = normalize_identifier(&bookmark.verse_key) {
        return Identifier::Key(key);
    }
    if let Some(api_id) = normalize_identifier(bookmark.verse_api_id) {
        return Identifier::ApiId(api_id);
    }
    Identifier::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accepts_verse_key() {
        assert_eq!(normalize_identifier("2:255"), Some("2:255".to_string()));
    }

    #[test]
    fn test_normalize_accepts_verse_key_range() {
        assert_eq!(normalize_identifier("2:255-257"), Some("2:255-257".to_string()));
    }

    #[test]
    fn test_normalize_trims_numeric_id() {
        assert_eq!(normalize_identifier(" 42 "), Some("42".to_string()));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_identifier("abc"), None);
        assert_eq!(normalize_identifier(""), None);
        assert_eq!(normalize_identifier("   "), None);
        assert_eq!(normalize_identifier("2:"), None);
        assert_eq!(normalize_identifier(":255"), None);
        assert_eq!(normalize_identifier("2:255-"), None);
        assert_eq!(normalize_identifier("2:255-257-259"), None);
        assert_eq!(normalize_identifier("2:2a5"), None);
        assert_eq!(normalize_identifier("1.5"), None);
    }

    #[test]
    fn test_normalize_numbers_and_absent() {
        assert_eq!(normalize_identifier(262i64), Some("262".to_string()));
        assert_eq!(normalize_identifier(-3i64), None);
        assert_eq!(normalize_identifier(None::<i64>), None);
        assert_eq!(normalize_identifier(None::<&str>), None);
    }

    #[test]
    fn test_derive_prefers_verse_id() {
        let bookmark = Bookmark {
            verse_id: Some("262".to_string()),
            verse_key: Some("2:255".to_string()),
            verse_api_id: Some(262),
            ..Default::default()
        };
        let identifier = derive_identifier(&bookmark);
        assert_eq!(identifier, Identifier::Id("262".to_string()));
        assert_eq!(identifier.source(), Some(IdentifierSource::VerseId));
    }

    #[test]
    fn test_derive_falls_back_to_verse_key() {
        let bookmark = Bookmark {
            verse_id: Some("not-an-id".to_string()),
            verse_key: Some("2:255".to_string()),
            verse_api_id: Some(262),
            ..Default::default()
        };
        let identifier = derive_identifier(&bookmark);
        assert_eq!(identifier, Identifier::Key("2:255".to_string()));
        assert_eq!(identifier.source(), Some(IdentifierSource::VerseKey));
    }

    #[test]
    fn test_derive_falls_back_to_api_id() {
        let bookmark = Bookmark {
            verse_key: Some("bogus".to_string()),
            verse_api_id: Some(262),
            ..Default::default()
        };
        let identifier = derive_identifier(&bookmark);
        assert_eq!(identifier, Identifier::ApiId("262".to_string()));
        assert_eq!(identifier.source(), Some(IdentifierSource::VerseApiId));
    }

    #[test]
    fn test_derive_empty_bookmark() {
        let identifier = derive_identifier(&Bookmark::default());
        assert!(identifier.is_empty());
        assert_eq!(identifier.as_str(), "");
        assert_eq!(identifier.source(), None);
        assert_eq!(identifier.value(), None);
    }

    #[test]
    fn test_verse_id_holding_a_key() {
        let bookmark = Bookmark {
            verse_id: Some("2:255".to_string()),
            ..Default::default()
        };
        let identifier = derive_identifier(&bookmark);
        assert_eq!(identifier.source(), Some(IdentifierSource::VerseId));
        assert!(identifier.is_verse_key());
    }
}
