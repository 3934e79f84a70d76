//! Error type shared by the Tilawa crates
//!
//! Reconciliation itself never fails; these errors come from the edges:
//! the bookmark database, config files and the root folder.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Bookmark database query failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Root folder or config file I/O
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored bookmark record is not valid JSON
    #[error("Bookmark record error: {0}")]
    Record(#[from] serde_json::Error),

    /// `tilawa.toml` could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store state changed underneath an operation
    #[error("Internal error: {0}")]
    Internal(String),
}
