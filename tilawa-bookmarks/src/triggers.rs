//! Evaluation pipeline and recomputation triggers
//!
//! [`evaluate_bookmark`] runs the whole one-way pipeline for one stored
//! bookmark: identifier, resolver, reconciliation, enrichment, presentation.
//!
//! The two write paths have named dependency sets:
//! - identifier trigger: [`IdentifierInputs`]
//! - content trigger: [`ContentInputs`]
//!
//! A [`ReconcileSession`] remembers the last inputs of each trigger and only
//! releases a patch when that trigger's own inputs changed. An identifier
//! correction therefore never re-issues the content write, and the other way
//! round. Loop freedom still comes from the builders being idempotent.

use crate::enrich::{build_fallback_verse, enrich_bookmark_with_verse};
use crate::fetch::FetchState;
use crate::identifier::{derive_identifier, Identifier};
use crate::presentation::{canonical_fetch_key, derive_status, BookmarkStatus, StatusInputs};
use crate::reconcile::{
    build_identifier_patch, build_verse_data_patch, IdentifierPatch, VerseDataPatch,
};
use crate::resolver::{normalize_bookmark_with_identifier, resolve_verse_key};
use tilawa_common::{Bookmark, Chapter, Verse};
use tracing::debug;

/// Dependencies of the identifier patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierInputs {
    pub identifier: Identifier,
    pub stored_verse_id: Option<String>,
    pub stored_verse_key: Option<String>,
}

impl IdentifierInputs {
    pub fn build_patch(&self) -> Option<IdentifierPatch> {
        build_identifier_patch(
            &self.identifier,
            self.stored_verse_id.as_deref(),
            self.stored_verse_key.as_deref(),
        )
    }
}

/// Dependencies of the content patch
#[derive(Debug, Clone, PartialEq)]
pub struct ContentInputs {
    pub verse: Option<Verse>,
    pub bookmark: Bookmark,
    pub chapters: Vec<Chapter>,
    pub fallback_translation: Option<String>,
}

impl ContentInputs {
    pub fn build_patch(&self) -> Option<VerseDataPatch> {
        let verse = self.verse.as_ref()?;
        build_verse_data_patch(
            verse,
            &self.bookmark,
            &self.chapters,
            self.fallback_translation.as_deref(),
        )
    }
}

/// Everything derived from one stored bookmark and one fetch snapshot.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub identifier: Identifier,
    pub resolved_key: Option<String>,
    /// Identifiers normalized, verse key backfilled
    pub normalized: Bookmark,
    /// Normalized bookmark filled in from the resolved verse, for display
    pub display: Bookmark,
    pub identifier_inputs: IdentifierInputs,
    pub content_inputs: ContentInputs,
    pub identifier_patch: Option<IdentifierPatch>,
    pub content_patch: Option<VerseDataPatch>,
    pub status: BookmarkStatus,
}

/// Run the full pipeline for `stored`.
pub fn evaluate_bookmark(
    stored: &Bookmark,
    fetch: &FetchState,
    chapters: &[Chapter],
    fallback_translation: Option<&str>,
) -> Evaluation {
    let identifier = derive_identifier(stored);
    let resolved_key = resolve_verse_key(stored, &identifier, chapters);
    let normalized =
        normalize_bookmark_with_identifier(stored, &identifier, resolved_key.as_deref());

    let identifier_inputs = IdentifierInputs {
        identifier: identifier.clone(),
        stored_verse_id: stored.verse_id.clone(),
        stored_verse_key: stored.verse_key.clone(),
    };
    let content_inputs = ContentInputs {
        verse: fetch.verse.clone(),
        bookmark: normalized.clone(),
        chapters: chapters.to_vec(),
        fallback_translation: fallback_translation.map(str::to_string),
    };
    let identifier_patch = identifier_inputs.build_patch();
    let content_patch = content_inputs.build_patch();

    let fallback = build_fallback_verse(&normalized, resolved_key.as_deref());
    let fetch_key = canonical_fetch_key(&identifier, resolved_key.as_deref());
    let status = derive_status(StatusInputs {
        fetch,
        fallback: fallback.as_ref(),
        fetch_key: fetch_key.as_deref(),
    });

    let display = match &status.resolved_verse {
        Some(verse) => enrich_bookmark_with_verse(&normalized, verse, chapters, fallback_translation),
        None => normalized.clone(),
    };

    Evaluation {
        identifier,
        resolved_key,
        normalized,
        display,
        identifier_inputs,
        content_inputs,
        identifier_patch,
        content_patch,
        status,
    }
}

/// Patches released by a [`ReconcileSession`] for one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingWrites {
    pub identifier: Option<IdentifierPatch>,
    pub content: Option<VerseDataPatch>,
}

impl PendingWrites {
    pub fn is_empty(&self) -> bool {
        self.identifier.is_none() && self.content.is_none()
    }
}

/// Last-seen trigger inputs for one bookmark.
#[derive(Debug, Default)]
pub struct ReconcileSession {
    last_identifier: Option<IdentifierInputs>,
    last_content: Option<ContentInputs>,
}

impl ReconcileSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier trigger: recompute only when its inputs changed.
    pub fn identifier_trigger(&mut self, inputs: &IdentifierInputs) -> Option<IdentifierPatch> {
        if self.last_identifier.as_ref() == Some(inputs) {
            return None;
        }
        self.last_identifier = Some(inputs.clone());
        inputs.build_patch()
    }

    /// Content trigger: recompute only when its inputs changed.
    pub fn content_trigger(&mut self, inputs: &ContentInputs) -> Option<VerseDataPatch> {
        if self.last_content.as_ref() == Some(inputs) {
            return None;
        }
        self.last_content = Some(inputs.clone());
        inputs.build_patch()
    }

    /// Run both triggers against an evaluation.
    pub fn pending_writes(&mut self, evaluation: &Evaluation) -> PendingWrites {
        let writes = PendingWrites {
            identifier: self.identifier_trigger(&evaluation.identifier_inputs),
            content: self.content_trigger(&evaluation.content_inputs),
        };
        if !writes.is_empty() {
            debug!(
                identifier = %evaluation.identifier,
                identifier_patch = writes.identifier.is_some(),
                content_patch = writes.content.is_some(),
                "Reconciliation released writes"
            );
        }
        writes
    }
}
