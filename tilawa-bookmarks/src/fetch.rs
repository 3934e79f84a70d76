//! Verse fetch collaborator
//!
//! [`VerseSource`] is the seam to the remote content API. [`VerseCache`]
//! wraps a source and exposes the non-blocking shape the reconciliation core
//! consumes: a [`FetchState`] snapshot with loading and error flags, plus a
//! refetch. Fetches run as background tasks; when one settles the identifier
//! is broadcast so interested bookmarks can be re-evaluated.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tilawa_common::{Chapter, Verse};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

/// Capacity of the settled-identifier broadcast channel
const SETTLED_CHANNEL_CAPACITY: usize = 64;

/// Content API errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Verse not found: {0}")]
    VerseNotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid verse identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Remote source of authoritative verse and chapter data
#[async_trait]
pub trait VerseSource: Send + Sync {
    /// Fetch one verse by canonical identifier (verse id or verse key)
    async fn fetch_verse(&self, identifier: &str) -> Result<Verse, FetchError>;

    /// Fetch the chapter list (any order)
    async fn fetch_chapters(&self) -> Result<Vec<Chapter>, FetchError>;
}

/// Snapshot of a fetch for one identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchState {
    pub verse: Option<Verse>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl FetchState {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Default::default()
        }
    }

    pub fn loaded(verse: Verse) -> Self {
        Self {
            verse: Some(verse),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Per-identifier fetch cache over a [`VerseSource`].
#[derive(Clone)]
pub struct VerseCache {
    source: Arc<dyn VerseSource>,
    entries: Arc<RwLock<HashMap<String, FetchState>>>,
    settled: broadcast::Sender<String>,
}

impl VerseCache {
    pub fn new(source: Arc<dyn VerseSource>) -> Self {
        let (settled, _) = broadcast::channel(SETTLED_CHANNEL_CAPACITY);
        Self {
            source,
            entries: Arc::new(RwLock::new(HashMap::new())),
            settled,
        }
    }

    pub fn source(&self) -> Arc<dyn VerseSource> {
        Arc::clone(&self.source)
    }

    /// Receive identifiers whose fetch has just settled
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.settled.subscribe()
    }

    /// Current state without starting a fetch
    pub async fn peek(&self, identifier: &str) -> FetchState {
        self.entries
            .read()
            .await
            .get(identifier)
            .cloned()
            .unwrap_or_default()
    }

    /// Current state for `identifier`, starting a background fetch on first use.
    ///
    /// An empty identifier never fetches.
    pub async fn state(&self, identifier: &str) -> FetchState {
        if identifier.is_empty() {
            return FetchState::default();
        }

        if let Some(state) = self.entries.read().await.get(identifier) {
            return state.clone();
        }

        self.spawn_fetch(identifier).await
    }

    /// Re-issue the fetch for `identifier` in the background.
    ///
    /// A previously fetched verse stays visible while the refetch runs.
    pub async fn refetch(&self, identifier: &str) -> FetchState {
        if identifier.is_empty() {
            return FetchState::default();
        }
        self.spawn_fetch(identifier).await
    }

    /// Fetch `identifier` and wait for the result.
    pub async fn load(&self, identifier: &str) -> FetchState {
        if identifier.is_empty() {
            return FetchState::default();
        }
        self.mark_loading(identifier).await;
        self.run_fetch(identifier.to_string()).await
    }

    async fn spawn_fetch(&self, identifier: &str) -> FetchState {
        let (snapshot, already_loading) = self.mark_loading(identifier).await;
        if already_loading {
            return snapshot;
        }

        let cache = self.clone();
        let identifier = identifier.to_string();
        tokio::spawn(async move {
            cache.run_fetch(identifier).await;
        });

        snapshot
    }

    /// Flag `identifier` as loading; returns the new snapshot and whether a
    /// fetch was already in flight.
    async fn mark_loading(&self, identifier: &str) -> (FetchState, bool) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(identifier.to_string()).or_default();
        let already_loading = entry.is_loading;
        entry.is_loading = true;
        entry.error = None;
        (entry.clone(), already_loading)
    }

    async fn run_fetch(&self, identifier: String) -> FetchState {
        debug!(identifier = %identifier, "Fetching verse");
        let result = self.source.fetch_verse(&identifier).await;

        let state = {
            let mut entries = self.entries.write().await;
            let entry = entries.entry(identifier.clone()).or_default();
            match result {
                Ok(verse) => *entry = FetchState::loaded(verse),
                Err(e) => {
                    warn!(identifier = %identifier, error = %e, "Verse fetch failed");
                    entry.is_loading = false;
                    entry.error = Some(e.to_string());
                }
            }
            entry.clone()
        };

        // No subscribers is fine
        let _ = self.settled.send(identifier);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl VerseSource for CountingSource {
        async fn fetch_verse(&self, identifier: &str) -> Result<Verse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::ApiError(500, "upstream down".to_string()));
            }
            Ok(Verse {
                id: 262,
                verse_key: identifier.to_string(),
                text_uthmani: "text".to_string(),
                translations: vec![],
            })
        }

        async fn fetch_chapters(&self) -> Result<Vec<Chapter>, FetchError> {
            Ok(vec![])
        }
    }

    fn cache(fail: bool) -> (VerseCache, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail,
        });
        (VerseCache::new(source.clone()), source)
    }

    #[tokio::test]
    async fn test_state_starts_fetch_and_settles() {
        let (cache, source) = cache(false);
        let mut settled = cache.subscribe();

        let first = cache.state("2:255").await;
        assert!(first.is_loading);
        assert!(first.verse.is_none());

        assert_eq!(settled.recv().await.unwrap(), "2:255");
        let after = cache.state("2:255").await;
        assert!(!after.is_loading);
        assert_eq!(after.verse.unwrap().verse_key, "2:255");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_identifier_never_fetches() {
        let (cache, source) = cache(false);
        assert_eq!(cache.state("").await, FetchState::default());
        assert_eq!(cache.load("").await, FetchState::default());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_reports_error() {
        let (cache, _) = cache(true);
        let state = cache.load("2:255").await;
        assert!(!state.is_loading);
        assert!(state.verse.is_none());
        assert_eq!(state.error.as_deref(), Some("API error 500: upstream down"));
    }

    #[tokio::test]
    async fn test_refetch_keeps_previous_verse_while_loading() {
        let (cache, source) = cache(false);
        cache.load("2:255").await;

        let refetching = cache.refetch("2:255").await;
        assert!(refetching.is_loading);
        assert!(refetching.verse.is_some());
        assert!(source.calls.load(Ordering::SeqCst) >= 1);
    }
}
