//! Fallback verses and bookmark enrichment

use crate::resolver::surah_name_for_key;
use tilawa_common::{Bookmark, Chapter, Translation, Verse};

/// First translation text of `verse`, or `fallback` when it has none.
pub fn primary_translation(verse: &Verse, fallback: Option<&str>) -> Option<String> {
    verse
        .translations
        .first()
        .map(|t| t.text.clone())
        .or_else(|| fallback.map(str::to_string))
}

/// Build a verse from the bookmark's cached fields.
///
/// Lets the UI show something while the fetch is pending or after it failed.
/// `None` when there is no verse key or no cached text: nothing to show yet.
pub fn build_fallback_verse(bookmark: &Bookmark, verse_key: Option<&str>) -> Option<Verse> {
    let verse_key = verse_key.filter(|k| !k.is_empty())?;
    let text = bookmark.verse_text.as_deref().filter(|t| !t.is_empty())?;

    let translations = bookmark
        .translation
        .as_ref()
        .map(|text| {
            vec![Translation {
                resource_id: 0,
                text: text.clone(),
            }]
        })
        .unwrap_or_default();

    Some(Verse {
        id: bookmark.verse_api_id.unwrap_or(0),
        verse_key: verse_key.to_string(),
        text_uthmani: text.to_string(),
        translations,
    })
}

/// Copy of `bookmark` filled in from `verse` for display.
///
/// Independent of whether the matching content patch has been persisted.
pub fn enrich_bookmark_with_verse(
    bookmark: &Bookmark,
    verse: &Verse,
    chapters: &[Chapter],
    fallback_translation: Option<&str>,
) -> Bookmark {
    let mut next = bookmark.clone();

    next.verse_key = Some(verse.verse_key.clone());
    if verse.id > 0 {
        next.verse_api_id = Some(verse.id);
    }
    next.verse_text = Some(verse.text_uthmani.clone());
    if let Some(name) = surah_name_for_key(&verse.verse_key, chapters) {
        next.surah_name = Some(name);
    }
    if let Some(translation) = primary_translation(verse, fallback_translation) {
        next.translation = Some(translation);
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse() -> Verse {
        Verse {
            id: 262,
            verse_key: "2:255".to_string(),
            text_uthmani: "ٱللَّهُ لَآ إِلَٰهَ إِلَّا هُوَ".to_string(),
            translations: vec![Translation {
                resource_id: 20,
                text: "Allah - there is no deity except Him".to_string(),
            }],
        }
    }

    #[test]
    fn test_primary_translation_prefers_verse() {
        assert_eq!(
            primary_translation(&verse(), Some("fallback")).as_deref(),
            Some("Allah - there is no deity except Him")
        );

        let bare = Verse {
            translations: vec![],
            ..verse()
        };
        assert_eq!(primary_translation(&bare, Some("fallback")).as_deref(), Some("fallback"));
        assert_eq!(primary_translation(&bare, None), None);
    }

    #[test]
    fn test_fallback_verse_from_cache() {
        let bookmark = Bookmark {
            verse_id: Some("262".to_string()),
            verse_api_id: Some(262),
            verse_text: Some("cached text".to_string()),
            translation: Some("cached translation".to_string()),
            ..Default::default()
        };

        let fallback = build_fallback_verse(&bookmark, Some("2:255")).unwrap();
        assert_eq!(fallback.id, 262);
        assert_eq!(fallback.verse_key, "2:255");
        assert_eq!(fallback.text_uthmani, "cached text");
        assert_eq!(fallback.translations[0].text, "cached translation");
    }

    #[test]
    fn test_fallback_verse_needs_key_and_text() {
        let with_text = Bookmark {
            verse_text: Some("cached text".to_string()),
            ..Default::default()
        };
        assert!(build_fallback_verse(&with_text, None).is_none());
        assert!(build_fallback_verse(&Bookmark::default(), Some("2:255")).is_none());
    }

    #[test]
    fn test_enrich_fills_all_fields() {
        let chapters = vec![Chapter::new(2, 286, "Al-Baqarah")];
        let bookmark = Bookmark {
            verse_id: Some("262".to_string()),
            ..Default::default()
        };

        let enriched = enrich_bookmark_with_verse(&bookmark, &verse(), &chapters, None);
        assert_eq!(enriched.verse_id.as_deref(), Some("262"));
        assert_eq!(enriched.verse_key.as_deref(), Some("2:255"));
        assert_eq!(enriched.verse_api_id, Some(262));
        assert_eq!(enriched.surah_name.as_deref(), Some("Al-Baqarah"));
        assert_eq!(
            enriched.translation.as_deref(),
            Some("Allah - there is no deity except Him")
        );
    }

    #[test]
    fn test_enrich_with_fallback_keeps_missing_api_id() {
        let bookmark = Bookmark {
            verse_key: Some("2:255".to_string()),
            verse_text: Some("cached".to_string()),
            ..Default::default()
        };
        let fallback = build_fallback_verse(&bookmark, Some("2:255")).unwrap();

        let enriched = enrich_bookmark_with_verse(&bookmark, &fallback, &[], None);
        assert_eq!(enriched.verse_api_id, None);
        assert_eq!(enriched.surah_name.as_deref(), Some("Surah 2"));
    }
}
