//! Bookmark endpoints
//!
//! Every read evaluates the bookmark: the verse fetch is started if needed,
//! reconciliation writes are issued, and the derived status is returned.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tilawa_common::Bookmark;
use tracing::info;

use crate::service::BookmarkView;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct BookmarkListResponse {
    pub total: usize,
    pub bookmarks: Vec<BookmarkView>,
}

/// GET /api/bookmarks
pub async fn list_bookmarks(State(state): State<AppState>) -> ApiResult<Json<BookmarkListResponse>> {
    let bookmarks = state.service.list_views().await?;
    Ok(Json(BookmarkListResponse {
        total: bookmarks.len(),
        bookmarks,
    }))
}

/// GET /api/bookmarks/:id
///
/// `id` is the bookmark's verseId, or its guid when it has none.
pub async fn get_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BookmarkView>> {
    state
        .service
        .view(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("bookmark {}", id)))
}

/// POST /api/bookmarks/:id/refetch
///
/// Retry path for upstream fetch errors.
pub async fn refetch_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BookmarkView>> {
    state
        .service
        .refetch(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("bookmark {}", id)))
}

/// POST /api/bookmarks
///
/// **Request:** a bookmark record with at least one of `verseId`, `verseKey`,
/// `verseApiId`. Other fields are stored as given.
pub async fn create_bookmark(
    State(state): State<AppState>,
    Json(bookmark): Json<Bookmark>,
) -> ApiResult<(StatusCode, Json<BookmarkView>)> {
    if bookmark.verse_id.is_none() && bookmark.verse_key.is_none() && bookmark.verse_api_id.is_none()
    {
        return Err(ApiError::BadRequest(
            "bookmark needs one of verseId, verseKey or verseApiId".to_string(),
        ));
    }

    let view = state.service.create(&bookmark).await?;
    info!(guid = %view.guid, "Bookmark created via API");
    Ok((StatusCode::CREATED, Json(view)))
}
