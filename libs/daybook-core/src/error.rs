//! Error types for daybook-core.

use thiserror::Error;

use crate::storage::StorageError;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors reported by the core collections and the review engine.
///
/// None of these are fatal: `NotFound` and `Validation` are no-op-able from
/// the caller's perspective, and `Storage` simply propagates whatever the
/// backing store reported.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
