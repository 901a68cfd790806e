//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// Store errors are propagated upward untouched; the core never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value could not be decoded (unknown permission or flag,
    /// malformed column).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("connection lock poisoned: {0}")]
    LockPoisoned(String),

    /// A blocking task failed to complete.
    #[error("background task error: {0}")]
    Background(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
