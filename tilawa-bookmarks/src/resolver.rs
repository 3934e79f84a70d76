//! Identifier resolver
//!
//! Produces a verse key for a bookmark even when it only carries a sequential
//! verse number. The sequential numbering runs 1..N across all chapters in
//! ascending chapter order, so chapter `c` owns the numbers in
//! `(sum(counts before c), sum(counts up to and including c)]`.

use crate::identifier::{is_verse_id, is_verse_key, normalize_identifier, Identifier};
use tilawa_common::{Bookmark, Chapter};
use tracing::debug;

/// Resolve a verse key for `bookmark`.
///
/// Order: the bookmark's own valid key, then the derived identifier if it is
/// a key, then inference from `verseApiId`, then inference from `verseId`.
pub fn resolve_verse_key(
    bookmark: &Bookmark,
    identifier: &Identifier,
    chapters: &[Chapter],
) -> Option<String> {
    if let Some(key) = bookmark.verse_key.as_deref().filter(|k| is_verse_key(k)) {
        return Some(key.to_string());
    }

    if identifier.is_verse_key() {
        return Some(identifier.as_str().to_string());
    }

    let candidates = [
        normalize_identifier(bookmark.verse_api_id),
        normalize_identifier(&bookmark.verse_id),
    ];

    for candidate in candidates.into_iter().flatten() {
        if !is_verse_id(&candidate) {
            continue;
        }
        let Ok(number) = candidate.parse::<i64>() else {
            continue;
        };
        if let Some(key) = infer_verse_key_from_sequential_id(number, chapters) {
            debug!(sequential_id = number, verse_key = %key, "Inferred verse key");
            return Some(key);
        }
    }

    None
}

/// Map a sequential verse number onto `"{chapter}:{verse}"`.
///
/// `chapters` must already be ascending by id. Chapters with a non-positive
/// verse count are skipped. Returns `None` for numbers `<= 0` or past the
/// last verse.
pub fn infer_verse_key_from_sequential_id(number: i64, chapters: &[Chapter]) -> Option<String> {
    if number <= 0 {
        return None;
    }

    let mut remainder = number;
    for chapter in chapters {
        if chapter.verses_count <= 0 {
            continue;
        }
        if remainder <= chapter.verses_count {
            return Some(format!("{}:{}", chapter.id, remainder));
        }
        remainder -= chapter.verses_count;
    }

    None
}

/// Return a copy of `bookmark` with its identifiers normalized.
///
/// `verseId` becomes the derived identifier when that is non-empty and
/// different. `verseKey` is only backfilled when the bookmark has none; an
/// existing key is never overwritten.
pub fn normalize_bookmark_with_identifier(
    bookmark: &Bookmark,
    identifier: &Identifier,
    resolved_key: Option<&str>,
) -> Bookmark {
    let mut next = bookmark.clone();

    if let Some(id) = identifier.value() {
        if bookmark.verse_id.as_deref() != Some(id) {
            next.verse_id = Some(id.to_string());
        }
    }

    let has_key = bookmark
        .verse_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty());
    if !has_key {
        if let Some(key) = resolved_key {
            next.verse_key = Some(key.to_string());
        }
    }

    next
}

/// Leading chapter number of a verse key (`"2:255"` → 2).
pub fn chapter_number_from_key(verse_key: &str) -> Option<u32> {
    let (chapter, _) = verse_key.trim().split_once(':')?;
    chapter.parse().ok()
}

/// Display name of the chapter owning `verse_key`.
///
/// Uses the chapter's simple name, or `"Surah {n}"` when the chapter list has
/// no usable entry. `None` only when the key has no chapter number.
pub fn surah_name_for_key(verse_key: &str, chapters: &[Chapter]) -> Option<String> {
    let number = chapter_number_from_key(verse_key)?;
    let name = chapters
        .iter()
        .find(|c| c.id == number)
        .map(|c| c.name_simple.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Surah {}", number));
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters() -> Vec<Chapter> {
        vec![
            Chapter::new(1, 7, "Al-Fatihah"),
            Chapter::new(2, 286, "Al-Baqarah"),
            Chapter::new(3, 200, "Ali 'Imran"),
        ]
    }

    #[test]
    fn test_infer_chapter_boundaries() {
        let chapters = chapters();
        assert_eq!(infer_verse_key_from_sequential_id(1, &chapters), Some("1:1".to_string()));
        assert_eq!(infer_verse_key_from_sequential_id(7, &chapters), Some("1:7".to_string()));
        assert_eq!(infer_verse_key_from_sequential_id(8, &chapters), Some("2:1".to_string()));
        assert_eq!(infer_verse_key_from_sequential_id(293, &chapters), Some("2:286".to_string()));
        assert_eq!(infer_verse_key_from_sequential_id(294, &chapters), Some("3:1".to_string()));
        assert_eq!(infer_verse_key_from_sequential_id(493, &chapters), Some("3:200".to_string()));
    }

    #[test]
    fn test_infer_out_of_range() {
        let chapters = chapters();
        assert_eq!(infer_verse_key_from_sequential_id(0, &chapters), None);
        assert_eq!(infer_verse_key_from_sequential_id(-5, &chapters), None);
        assert_eq!(infer_verse_key_from_sequential_id(494, &chapters), None);
        assert_eq!(infer_verse_key_from_sequential_id(1, &[]), None);
    }

    #[test]
    fn test_infer_skips_invalid_counts() {
        let chapters = vec![
            Chapter::new(1, 7, "Al-Fatihah"),
            Chapter::new(2, 0, "Broken"),
            Chapter::new(3, -4, "Broken"),
            Chapter::new(4, 176, "An-Nisa"),
        ];
        assert_eq!(infer_verse_key_from_sequential_id(8, &chapters), Some("4:1".to_string()));
    }

    #[test]
    fn test_resolve_prefers_bookmark_key() {
        let bookmark = Bookmark {
            verse_id: Some("1".to_string()),
            verse_key: Some("2:255".to_string()),
            ..Default::default()
        };
        let identifier = Identifier::Id("1".to_string());
        assert_eq!(
            resolve_verse_key(&bookmark, &identifier, &chapters()),
            Some("2:255".to_string())
        );
    }

    #[test]
    fn test_resolve_uses_identifier_key() {
        let bookmark = Bookmark {
            verse_id: Some("3:7".to_string()),
            ..Default::default()
        };
        let identifier = Identifier::Id("3:7".to_string());
        assert_eq!(
            resolve_verse_key(&bookmark, &identifier, &chapters()),
            Some("3:7".to_string())
        );
    }

    #[test]
    fn test_resolve_infers_from_api_id_before_verse_id() {
        let bookmark = Bookmark {
            verse_id: Some("1".to_string()),
            verse_api_id: Some(8),
            ..Default::default()
        };
        let identifier = Identifier::Id("1".to_string());
        assert_eq!(
            resolve_verse_key(&bookmark, &identifier, &chapters()),
            Some("2:1".to_string())
        );
    }

    #[test]
    fn test_resolve_falls_back_to_verse_id_inference() {
        let bookmark = Bookmark {
            verse_id: Some("294".to_string()),
            verse_api_id: Some(10_000),
            ..Default::default()
        };
        let identifier = Identifier::Id("294".to_string());
        assert_eq!(
            resolve_verse_key(&bookmark, &identifier, &chapters()),
            Some("3:1".to_string())
        );
    }

    #[test]
    fn test_resolve_nothing_usable() {
        let bookmark = Bookmark::default();
        assert_eq!(resolve_verse_key(&bookmark, &Identifier::None, &chapters()), None);
    }

    #[test]
    fn test_normalize_never_overwrites_existing_key() {
        let bookmark = Bookmark {
            verse_id: Some(" 8 ".to_string()),
            verse_key: Some("1:1".to_string()),
            ..Default::default()
        };
        let identifier = Identifier::Id("8".to_string());
        let normalized = normalize_bookmark_with_identifier(&bookmark, &identifier, Some("2:1"));

        assert_eq!(normalized.verse_id.as_deref(), Some("8"));
        assert_eq!(normalized.verse_key.as_deref(), Some("1:1"));
    }

    #[test]
    fn test_normalize_backfills_missing_key() {
        let bookmark = Bookmark {
            verse_api_id: Some(8),
            ..Default::default()
        };
        let identifier = Identifier::ApiId("8".to_string());
        let normalized = normalize_bookmark_with_identifier(&bookmark, &identifier, Some("2:1"));

        assert_eq!(normalized.verse_id.as_deref(), Some("8"));
        assert_eq!(normalized.verse_key.as_deref(), Some("2:1"));
    }

    #[test]
    fn test_normalize_empty_identifier_keeps_verse_id() {
        let bookmark = Bookmark {
            verse_id: Some("junk".to_string()),
            ..Default::default()
        };
        let normalized = normalize_bookmark_with_identifier(&bookmark, &Identifier::None, None);
        assert_eq!(normalized, bookmark);
    }

    #[test]
    fn test_surah_name_lookup_and_fallback() {
        let chapters = chapters();
        assert_eq!(surah_name_for_key("2:255", &chapters), Some("Al-Baqarah".to_string()));
        assert_eq!(surah_name_for_key("9:1", &chapters), Some("Surah 9".to_string()));
        assert_eq!(surah_name_for_key("bad", &chapters), None);
        assert_eq!(chapter_number_from_key("114:6"), Some(114));
    }
}
