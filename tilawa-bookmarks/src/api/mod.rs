//! HTTP API handlers

pub mod bookmarks;
pub mod chapters;
pub mod health;

pub use bookmarks::{create_bookmark, get_bookmark, list_bookmarks, refetch_bookmark};
pub use chapters::{list_chapters, reload_chapters};
pub use health::health_routes;
