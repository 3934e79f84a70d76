//! Bookmark service
//!
//! Glues the pure pipeline to its collaborators: reads bookmarks from the
//! store, takes fetch snapshots from the verse cache, issues the patches the
//! recomputation triggers release, and returns the derived view.

use crate::fetch::{FetchError, FetchState, VerseCache};
use crate::identifier::derive_identifier;
use crate::presentation::{canonical_fetch_key, BookmarkStatus};
use crate::reconcile::TargetedPatch;
use crate::resolver::resolve_verse_key;
use crate::store::{BookmarkStore, StoredBookmark};
use crate::triggers::{evaluate_bookmark, ReconcileSession};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tilawa_common::models::sort_chapters;
use tilawa_common::{Bookmark, Chapter, Result};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// One bookmark as the UI consumes it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmarkView {
    pub guid: String,
    /// Normalized bookmark, filled in from the resolved verse when available
    pub bookmark: Bookmark,
    pub status: BookmarkStatus,
}

#[derive(Clone)]
pub struct BookmarkService {
    store: Arc<dyn BookmarkStore>,
    verses: VerseCache,
    chapters: Arc<RwLock<Vec<Chapter>>>,
    sessions: Arc<Mutex<HashMap<String, ReconcileSession>>>,
    fallback_translation: Option<String>,
}

impl BookmarkService {
    /// `chapters` are sorted here before any inference uses them.
    pub fn new(
        store: Arc<dyn BookmarkStore>,
        verses: VerseCache,
        chapters: Vec<Chapter>,
        fallback_translation: Option<String>,
    ) -> Self {
        Self {
            store,
            verses,
            chapters: Arc::new(RwLock::new(sort_chapters(chapters))),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            fallback_translation,
        }
    }

    pub fn verses(&self) -> &VerseCache {
        &self.verses
    }

    pub async fn chapters(&self) -> Vec<Chapter> {
        self.chapters.read().await.clone()
    }

    /// Replace the chapter list from the content API.
    pub async fn load_chapters(&self) -> std::result::Result<usize, FetchError> {
        let chapters = sort_chapters(self.verses.source().fetch_chapters().await?);
        let count = chapters.len();
        *self.chapters.write().await = chapters;
        info!("Loaded {} chapters", count);
        Ok(count)
    }

    /// Find a bookmark by `verseId`, falling back to its guid.
    pub async fn find(&self, id: &str) -> Result<Option<StoredBookmark>> {
        if let Some(stored) = self.store.get_bookmark(id).await? {
            return Ok(Some(stored));
        }
        self.store.get_bookmark_by_guid(id).await
    }

    pub async fn create(&self, bookmark: &Bookmark) -> Result<BookmarkView> {
        let stored = self.store.create_bookmark(bookmark).await?;
        Ok(self.evaluate(stored).await)
    }

    pub async fn view(&self, id: &str) -> Result<Option<BookmarkView>> {
        match self.find(id).await? {
            Some(stored) => Ok(Some(self.evaluate(stored).await)),
            None => Ok(None),
        }
    }

    pub async fn list_views(&self) -> Result<Vec<BookmarkView>> {
        let mut views = Vec::new();
        for stored in self.store.list_bookmarks().await? {
            views.push(self.evaluate(stored).await);
        }
        Ok(views)
    }

    /// Re-issue the verse fetch for a bookmark.
    pub async fn refetch(&self, id: &str) -> Result<Option<BookmarkView>> {
        let Some(stored) = self.find(id).await? else {
            return Ok(None);
        };
        if let Some(key) = self.fetch_key(&stored.bookmark).await {
            info!(guid = %stored.guid, fetch_key = %key, "Refetching verse");
            self.verses.refetch(&key).await;
        }
        Ok(Some(self.evaluate(stored).await))
    }

    async fn fetch_key(&self, bookmark: &Bookmark) -> Option<String> {
        let chapters = self.chapters.read().await;
        let identifier = derive_identifier(bookmark);
        let resolved_key = resolve_verse_key(bookmark, &identifier, &chapters);
        canonical_fetch_key(&identifier, resolved_key.as_deref())
    }

    /// Evaluate one stored bookmark and issue any released writes.
    pub async fn evaluate(&self, stored: StoredBookmark) -> BookmarkView {
        let fetch = match self.fetch_key(&stored.bookmark).await {
            Some(key) => self.verses.state(&key).await,
            None => FetchState::default(),
        };

        let chapters = self.chapters.read().await.clone();
        let evaluation = evaluate_bookmark(
            &stored.bookmark,
            &fetch,
            &chapters,
            self.fallback_translation.as_deref(),
        );

        let writes = {
            let mut sessions = self.sessions.lock().await;
            sessions
                .entry(stored.guid.clone())
                .or_default()
                .pending_writes(&evaluation)
        };

        // Identifier first: the content patch is addressed by the normalized verseId
        if let Some(patch) = &writes.identifier {
            self.write(&stored.guid, "identifier", patch).await;
        }
        if let Some(patch) = &writes.content {
            self.write(&stored.guid, "content", patch).await;
        }

        BookmarkView {
            guid: stored.guid,
            bookmark: evaluation.display,
            status: evaluation.status,
        }
    }

    async fn write(&self, guid: &str, kind: &str, patch: &TargetedPatch) {
        match self
            .store
            .update_bookmark(&patch.target_verse_id, &patch.patch)
            .await
        {
            Ok(true) => debug!(guid = %guid, kind, target = %patch.target_verse_id, "Patch applied"),
            Ok(false) => warn!(
                guid = %guid,
                kind,
                target = %patch.target_verse_id,
                "Patch target not found in store"
            ),
            Err(e) => error!(guid = %guid, kind, error = %e, "Bookmark store rejected patch"),
        }
    }

    /// Re-evaluate bookmarks whenever a verse fetch settles.
    pub fn spawn_settle_listener(&self) -> JoinHandle<()> {
        let service = self.clone();
        let mut settled = self.verses.subscribe();

        tokio::spawn(async move {
            loop {
                match settled.recv().await {
                    Ok(identifier) => service.reevaluate_for(Some(&identifier)).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Settle listener lagged, re-evaluating all bookmarks");
                        service.reevaluate_for(None).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Settle listener stopped");
        })
    }

    /// Re-evaluate bookmarks fetched by `identifier`, or all when `None`.
    async fn reevaluate_for(&self, identifier: Option<&str>) {
        let bookmarks = match self.store.list_bookmarks().await {
            Ok(bookmarks) => bookmarks,
            Err(e) => {
                error!(error = %e, "Failed to list bookmarks for re-evaluation");
                return;
            }
        };

        for stored in bookmarks {
            if let Some(identifier) = identifier {
                if self.fetch_key(&stored.bookmark).await.as_deref() != Some(identifier) {
                    continue;
                }
            }
            self.evaluate(stored).await;
        }
    }
}
