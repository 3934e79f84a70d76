//! tilawa-bookmarks library
//!
//! Bookmark to verse reconciliation. A stored bookmark may reference its verse
//! by `verseId`, `verseKey` or `verseApiId`; this crate picks a canonical
//! identifier, infers missing verse keys, reconciles the record against the
//! fetched verse with minimal idempotent patches, and derives the status the
//! UI renders.
//!
//! Pipeline, each stage depending only on the ones before it:
//! [`identifier`] → [`resolver`] → [`reconcile`] / [`enrich`] → [`presentation`],
//! driven by [`triggers`].

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod content_client;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod identifier;
pub mod presentation;
pub mod reconcile;
pub mod resolver;
pub mod service;
pub mod store;
pub mod triggers;

pub use crate::error::{ApiError, ApiResult};
pub use crate::service::{BookmarkService, BookmarkView};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: BookmarkService,
}

impl AppState {
    pub fn new(service: BookmarkService) -> Self {
        Self { service }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route(
            "/api/bookmarks",
            get(api::list_bookmarks).post(api::create_bookmark),
        )
        .route("/api/bookmarks/:id", get(api::get_bookmark))
        .route("/api/bookmarks/:id/refetch", post(api::refetch_bookmark))
        .route("/api/chapters", get(api::list_chapters))
        .route("/api/chapters/reload", post(api::reload_chapters))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
