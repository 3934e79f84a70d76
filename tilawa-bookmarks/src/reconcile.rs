//! Reconciliation engine
//!
//! Decides what must be written back to the bookmark store. Two independent
//! builders:
//! - identifier patch: normalizes the stored `verseId`
//! - verse data patch: refreshes cached content from a fetched verse
//!
//! Both are pure and idempotent. Once a patch has been applied, calling the
//! builder again with the resulting record returns `None`, which is what keeps
//! repeated evaluation from writing in a loop.

use crate::enrich::primary_translation;
use crate::identifier::{normalize_identifier, Identifier};
use crate::resolver::surah_name_for_key;
use serde::Serialize;
use tilawa_common::{Bookmark, BookmarkPatch, Chapter, IdentifierSource, Verse};
use tracing::debug;

/// A patch addressed to the stored bookmark whose `verseId` is `target_verse_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetedPatch {
    pub target_verse_id: String,
    pub patch: BookmarkPatch,
}

/// Output of [`build_identifier_patch`]
pub type IdentifierPatch = TargetedPatch;

/// Output of [`build_verse_data_patch`]
pub type VerseDataPatch = TargetedPatch;

/// Patch the stored `verseId` to the derived identifier.
///
/// Nothing to do while either side is empty or when they already agree.
/// `verseKey` joins the patch only when the identifier came from `verseKey`
/// and the stored key does not normalize to it.
pub fn build_identifier_patch(
    identifier: &Identifier,
    stored_verse_id: Option<&str>,
    stored_verse_key: Option<&str>,
) -> Option<IdentifierPatch> {
    let derived = identifier.value()?;
    let stored = stored_verse_id.filter(|id| !id.is_empty())?;

    if stored == derived {
        return None;
    }

    let mut patch = BookmarkPatch {
        verse_id: Some(derived.to_string()),
        ..Default::default()
    };

    if identifier.source() == Some(IdentifierSource::VerseKey)
        && normalize_identifier(stored_verse_key).as_deref() != Some(derived)
    {
        patch.verse_key = Some(derived.to_string());
    }

    debug!(stored = %stored, derived = %derived, "Identifier patch required");

    Some(TargetedPatch {
        target_verse_id: stored.to_string(),
        patch,
    })
}

/// Refresh the bookmark's cached content from an authoritative verse.
///
/// Compares `verseKey`, `verseApiId`, `verseText`, `surahName` and, when one
/// is known, the translation. If anything differs the patch carries the whole
/// snapshot, not only the differing fields. The patch is addressed by the
/// bookmark's own `verseId`; a bookmark without one gets no patch.
pub fn build_verse_data_patch(
    verse: &Verse,
    bookmark: &Bookmark,
    chapters: &[Chapter],
    fallback_translation: Option<&str>,
) -> Option<VerseDataPatch> {
    let surah_name =
        surah_name_for_key(&verse.verse_key, chapters).or_else(|| bookmark.surah_name.clone());
    let translation = primary_translation(verse, fallback_translation);

    let consistent = bookmark.verse_key.as_deref() == Some(verse.verse_key.as_str())
        && bookmark.verse_api_id == Some(verse.id)
        && bookmark.verse_text.as_deref() == Some(verse.text_uthmani.as_str())
        && bookmark.surah_name == surah_name
        && translation
            .as_ref()
            .map_or(true, |t| bookmark.translation.as_ref() == Some(t));

    if consistent {
        return None;
    }

    let Some(target) = bookmark.verse_id.as_deref().filter(|id| !id.trim().is_empty()) else {
        debug!(verse_key = %verse.verse_key, "Bookmark has no verseId, skipping content patch");
        return None;
    };

    debug!(target = %target, verse_key = %verse.verse_key, "Content patch required");

    Some(TargetedPatch {
        target_verse_id: target.to_string(),
        patch: BookmarkPatch {
            verse_id: None,
            verse_key: Some(verse.verse_key.clone()),
            verse_api_id: Some(verse.id),
            verse_text: Some(verse.text_uthmani.clone()),
            translation,
            surah_name,
        },
    })
}
