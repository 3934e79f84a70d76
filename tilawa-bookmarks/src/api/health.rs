//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Zero until the chapter list has been loaded; only direct ids and
    /// verse keys resolve until then
    pub chapters_loaded: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "tilawa-bookmarks".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chapters_loaded: state.service.chapters().await.len(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
