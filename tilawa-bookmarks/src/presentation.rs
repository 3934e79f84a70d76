//! Presentation derivation
//!
//! Turns the current fetch snapshot and the reconciliation results into the
//! single status the UI renders. Nothing is stored: the status is recomputed
//! from its inputs every time.

use crate::fetch::FetchState;
use crate::identifier::Identifier;
use serde::Serialize;
use tilawa_common::Verse;

/// Shown when a bookmark carries no usable verse reference at all
pub const MISSING_REFERENCE_MESSAGE: &str =
    "This bookmark is missing its verse reference. Remove it and bookmark the verse again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    /// A fetched or cached verse is available
    Resolved,
    /// Identifier known, verse not available yet
    Pending,
    /// No identifier could be derived; a fetch was never attempted
    Unresolvable,
    /// Identifier known but the fetch failed
    UpstreamError,
}

/// What the UI needs to render one bookmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkStatus {
    pub state: StatusState,
    /// Authoritative verse, when fetched
    pub verse: Option<Verse>,
    /// Authoritative verse, else the fallback built from cached fields
    pub resolved_verse: Option<Verse>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Identifier to pass to the fetch collaborator's refetch
    pub fetch_key: Option<String>,
}

/// Inputs of [`derive_status`]
#[derive(Debug, Clone, Copy)]
pub struct StatusInputs<'a> {
    pub fetch: &'a FetchState,
    pub fallback: Option<&'a Verse>,
    pub fetch_key: Option<&'a str>,
}

/// Identifier the verse is fetched by: the derived identifier, else the
/// resolved verse key.
pub fn canonical_fetch_key(identifier: &Identifier, resolved_key: Option<&str>) -> Option<String> {
    identifier
        .value()
        .or(resolved_key)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

pub fn derive_status(inputs: StatusInputs<'_>) -> BookmarkStatus {
    let verse = inputs.fetch.verse.clone();
    let resolved_verse = verse.clone().or_else(|| inputs.fallback.cloned());
    let fetch_key = inputs.fetch_key.map(str::to_string);

    if resolved_verse.is_some() {
        return BookmarkStatus {
            state: StatusState::Resolved,
            verse,
            resolved_verse,
            is_loading: false,
            error: None,
            fetch_key,
        };
    }

    if fetch_key.is_none() {
        // The fetch collaborator's own error is irrelevant here
        return BookmarkStatus {
            state: StatusState::Unresolvable,
            verse: None,
            resolved_verse: None,
            is_loading: false,
            error: Some(MISSING_REFERENCE_MESSAGE.to_string()),
            fetch_key: None,
        };
    }

    if let (Some(error), false) = (&inputs.fetch.error, inputs.fetch.is_loading) {
        return BookmarkStatus {
            state: StatusState::UpstreamError,
            verse: None,
            resolved_verse: None,
            is_loading: false,
            error: Some(error.clone()),
            fetch_key,
        };
    }

    BookmarkStatus {
        state: StatusState::Pending,
        verse: None,
        resolved_verse: None,
        is_loading: inputs.fetch.is_loading,
        error: None,
        fetch_key,
    }
}
