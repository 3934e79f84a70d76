//! # Tilawa Common Library
//!
//! Shared code for the Tilawa services including:
//! - Bookmark, chapter and verse models
//! - Configuration loading and root folder resolution
//! - Database initialization
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{Bookmark, BookmarkPatch, Chapter, IdentifierSource, Translation, Verse};
