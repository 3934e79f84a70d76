//! End-to-end reconciliation tests over the pure pipeline
//!
//! Each test plays the write collaborator itself: released patches are merged
//! into the in-memory record, then the record is evaluated again.

use tilawa_bookmarks::fetch::FetchState;
use tilawa_bookmarks::identifier::Identifier;
use tilawa_bookmarks::presentation::StatusState;
use tilawa_bookmarks::reconcile::TargetedPatch;
use tilawa_bookmarks::triggers::{evaluate_bookmark, ReconcileSession};
use tilawa_common::{Bookmark, Chapter, Translation, Verse};

fn chapters() -> Vec<Chapter> {
    vec![
        Chapter::new(1, 7, "Al-Fatihah"),
        Chapter::new(2, 286, "Al-Baqarah"),
        Chapter::new(3, 200, "Ali 'Imran"),
    ]
}

fn ayat_al_kursi() -> Verse {
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

fn apply(record: &mut Bookmark, write: &TargetedPatch) {
    assert_eq!(record.verse_id.as_deref(), Some(write.target_verse_id.as_str()));
    *record = record.apply_patch(&write.patch);
}

/// Evaluate and write until nothing is released; returns the number of rounds
/// that released at least one write.
fn settle(record: &mut Bookmark, fetch: &FetchState, session: &mut ReconcileSession) -> usize {
    let chapters = chapters();
    let mut rounds = 0;
    loop {
        let evaluation = evaluate_bookmark(record, fetch, &chapters, None);
        let writes = session.pending_writes(&evaluation);
        if writes.is_empty() {
            return rounds;
        }
        if let Some(write) = &writes.identifier {
            apply(record, write);
        }
        if let Some(write) = &writes.content {
            apply(record, write);
        }
        rounds += 1;
        assert!(rounds < 5, "reconciliation did not settle");
    }
}

#[test]
fn test_padded_id_settles_to_consistent_record() {
    let mut record = Bookmark {
        verse_id: Some(" 262 ".to_string()),
        ..Default::default()
    };
    let fetch = FetchState::loaded(ayat_al_kursi());
    let mut session = ReconcileSession::new();

    let rounds = settle(&mut record, &fetch, &mut session);
    assert!(rounds >= 1);

    assert_eq!(record.verse_id.as_deref(), Some("262"));
    assert_eq!(record.verse_key.as_deref(), Some("2:255"));
    assert_eq!(record.verse_api_id, Some(262));
    assert_eq!(record.surah_name.as_deref(), Some("Al-Baqarah"));
    assert_eq!(
        record.translation.as_deref(),
        Some("Allah - there is no deity except Him")
    );

    // A fresh session (new process, same data) finds nothing to do
    let mut fresh = ReconcileSession::new();
    assert_eq!(settle(&mut record, &fetch, &mut fresh), 0);
}

#[test]
fn test_consistent_record_releases_nothing() {
    let mut record = Bookmark {
        verse_id: Some("2:255".to_string()),
        verse_key: Some("2:255".to_string()),
        verse_api_id: Some(262),
        verse_text: Some("ٱللَّهُ لَآ إِلَٰهَ إِلَّا هُوَ".to_string()),
        translation: Some("Allah - there is no deity except Him".to_string()),
        surah_name: Some("Al-Baqarah".to_string()),
        ..Default::default()
    };
    let before = record.clone();
    let fetch = FetchState::loaded(ayat_al_kursi());

    assert_eq!(settle(&mut record, &fetch, &mut ReconcileSession::new()), 0);
    assert_eq!(record, before);
}

#[test]
fn test_verse_key_bookmark_keeps_its_key() {
    let mut record = Bookmark {
        verse_id: Some("abc".to_string()),
        verse_key: Some("2:255".to_string()),
        ..Default::default()
    };
    let evaluation = evaluate_bookmark(&record, &FetchState::default(), &chapters(), None);
    assert_eq!(evaluation.identifier, Identifier::Key("2:255".to_string()));

    settle(
        &mut record,
        &FetchState::loaded(ayat_al_kursi()),
        &mut ReconcileSession::new(),
    );
    assert_eq!(record.verse_id.as_deref(), Some("2:255"));
    assert_eq!(record.verse_key.as_deref(), Some("2:255"));
}

#[test]
fn test_api_id_only_bookmark_is_normalized_for_display() {
    let record = Bookmark {
        verse_api_id: Some(262),
        ..Default::default()
    };
    let fetch = FetchState::loaded(ayat_al_kursi());

    let evaluation = evaluate_bookmark(&record, &fetch, &chapters(), None);
    assert_eq!(evaluation.identifier, Identifier::ApiId("262".to_string()));
    assert_eq!(evaluation.resolved_key.as_deref(), Some("2:255"));
    assert_eq!(evaluation.display.verse_id.as_deref(), Some("262"));
    assert_eq!(evaluation.display.surah_name.as_deref(), Some("Al-Baqarah"));
    assert_eq!(evaluation.status.state, StatusState::Resolved);

    // Nothing stored under a verseId yet, so no identifier correction
    assert!(evaluation.identifier_patch.is_none());
    let content = evaluation.content_patch.expect("record lacks verse content");
    assert_eq!(content.target_verse_id, "262");
}

#[test]
fn test_cached_fields_render_while_fetch_in_flight() {
    let record = Bookmark {
        verse_id: Some("2:255".to_string()),
        verse_text: Some("cached text".to_string()),
        ..Default::default()
    };
    let evaluation = evaluate_bookmark(&record, &FetchState::loading(), &chapters(), None);

    assert_eq!(evaluation.status.state, StatusState::Resolved);
    assert!(evaluation.status.verse.is_none());
    assert_eq!(
        evaluation.status.resolved_verse.as_ref().map(|v| v.text_uthmani.as_str()),
        Some("cached text")
    );
    assert!(evaluation.content_patch.is_none());
}

#[test]
fn test_translation_drift_rewrites_whole_snapshot() {
    let mut record = Bookmark {
        verse_id: Some("2:255".to_string()),
        verse_key: Some("2:255".to_string()),
        verse_api_id: Some(262),
        verse_text: Some("ٱللَّهُ لَآ إِلَٰهَ إِلَّا هُوَ".to_string()),
        translation: Some("an older rendering".to_string()),
        surah_name: Some("Al-Baqarah".to_string()),
        ..Default::default()
    };
    let evaluation = evaluate_bookmark(
        &record,
        &FetchState::loaded(ayat_al_kursi()),
        &chapters(),
        None,
    );
    let write = evaluation.content_patch.expect("translation drift needs a patch");
    assert!(write.patch.verse_text.is_some());
    assert!(write.patch.surah_name.is_some());

    apply(&mut record, &write);
    assert_eq!(
        record.translation.as_deref(),
        Some("Allah - there is no deity except Him")
    );
}
