//! Bookmark store collaborator
//!
//! The reconciliation core only reads bookmarks and issues patches addressed
//! by `verseId`. Each patch is merged into the stored record and the whole
//! record is written back; concurrent writers follow last-write-wins.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tilawa_common::{Bookmark, BookmarkPatch, Error, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A bookmark together with its storage key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredBookmark {
    pub guid: String,
    pub bookmark: Bookmark,
}

#[async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn list_bookmarks(&self) -> Result<Vec<StoredBookmark>>;

    /// Look up by the record's `verseId`
    async fn get_bookmark(&self, verse_id: &str) -> Result<Option<StoredBookmark>>;

    async fn get_bookmark_by_guid(&self, guid: &str) -> Result<Option<StoredBookmark>>;

    async fn create_bookmark(&self, bookmark: &Bookmark) -> Result<StoredBookmark>;

    /// Merge `patch` into every record whose `verseId` is `verse_id` and
    /// replace the records. Returns `false` when nothing matched.
    async fn update_bookmark(&self, verse_id: &str, patch: &BookmarkPatch) -> Result<bool>;
}

/// SQLite-backed [`BookmarkStore`]
#[derive(Clone)]
pub struct SqliteBookmarkStore {
    db: SqlitePool,
}

impl SqliteBookmarkStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

fn decode_row(guid: String, record: &str) -> Result<StoredBookmark> {
    let bookmark: Bookmark = serde_json::from_str(record)?;
    Ok(StoredBookmark { guid, bookmark })
}

#[async_trait]
impl BookmarkStore for SqliteBookmarkStore {
    async fn list_bookmarks(&self) -> Result<Vec<StoredBookmark>> {
        let rows = sqlx::query("SELECT guid, record FROM bookmarks ORDER BY created_at, guid")
            .fetch_all(&self.db)
            .await?;

        // One unreadable record must not hide the others
        let mut bookmarks = Vec::with_capacity(rows.len());
        for row in &rows {
            let guid: String = row.get("guid");
            match decode_row(guid.clone(), row.get::<&str, _>("record")) {
                Ok(stored) => bookmarks.push(stored),
                Err(e) => warn!(guid = %guid, error = %e, "Skipping undecodable bookmark record"),
            }
        }
        Ok(bookmarks)
    }

    async fn get_bookmark(&self, verse_id: &str) -> Result<Option<StoredBookmark>> {
        let row = sqlx::query(
            "SELECT guid, record FROM bookmarks WHERE verse_id = ? ORDER BY created_at LIMIT 1",
        )
        .bind(verse_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(|row| decode_row(row.get("guid"), row.get::<&str, _>("record")))
            .transpose()
    }

    async fn get_bookmark_by_guid(&self, guid: &str) -> Result<Option<StoredBookmark>> {
        let row = sqlx::query("SELECT guid, record FROM bookmarks WHERE guid = ?")
            .bind(guid)
            .fetch_optional(&self.db)
            .await?;

        row.map(|row| decode_row(row.get("guid"), row.get::<&str, _>("record")))
            .transpose()
    }

    async fn create_bookmark(&self, bookmark: &Bookmark) -> Result<StoredBookmark> {
        let guid = Uuid::new_v4().to_string();
        let record = serde_json::to_string(bookmark)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO bookmarks (guid, verse_id, record, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&guid)
        .bind(bookmark.verse_id.as_deref())
        .bind(&record)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await?;

        info!(guid = %guid, verse_id = ?bookmark.verse_id, "Created bookmark");

        Ok(StoredBookmark {
            guid,
            bookmark: bookmark.clone(),
        })
    }

    async fn update_bookmark(&self, verse_id: &str, patch: &BookmarkPatch) -> Result<bool> {
        if patch.is_empty() {
            return Ok(true);
        }

        let mut tx = self.db.begin().await?;

        let rows = sqlx::query("SELECT guid, record FROM bookmarks WHERE verse_id = ?")
            .bind(verse_id)
            .fetch_all(&mut *tx)
            .await?;

        if rows.is_empty() {
            debug!(verse_id = %verse_id, "No bookmark matched patch target");
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        for row in &rows {
            let stored = decode_row(row.get("guid"), row.get::<&str, _>("record"))?;
            let next = stored.bookmark.apply_patch(patch);
            let record = serde_json::to_string(&next)?;

            let result = sqlx::query(
                "UPDATE bookmarks SET verse_id = ?, record = ?, updated_at = ? WHERE guid = ?",
            )
            .bind(next.verse_id.as_deref())
            .bind(&record)
            .bind(&now)
            .bind(&stored.guid)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() != 1 {
                return Err(Error::Internal(format!(
                    "Bookmark {} vanished during update",
                    stored.guid
                )));
            }

            info!(
                guid = %stored.guid,
                target = %verse_id,
                verse_id = ?next.verse_id,
                "Replaced bookmark record"
            );
        }

        tx.commit().await?;
        Ok(true)
    }
}
