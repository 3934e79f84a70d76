//! Chapter list endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use tilawa_common::Chapter;

use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ChaptersResponse {
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub loaded: usize,
}

/// GET /api/chapters
///
/// Chapters ascending by id, as used for verse key inference.
pub async fn list_chapters(State(state): State<AppState>) -> Json<ChaptersResponse> {
    Json(ChaptersResponse {
        chapters: state.service.chapters().await,
    })
}

/// POST /api/chapters/reload
///
/// Refresh the chapter list from the content API.
pub async fn reload_chapters(State(state): State<AppState>) -> ApiResult<Json<ReloadResponse>> {
    let loaded = state.service.load_chapters().await?;
    Ok(Json(ReloadResponse { loaded }))
}
