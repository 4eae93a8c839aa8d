//! Snapshot error types.

use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur while encoding or decoding snapshots.
///
/// None of these are fatal: callers fall back to the store's default value.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The snapshot was written by a newer schema.
    #[error("Unsupported snapshot schema version {found} (supported up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The snapshot belongs to a different store.
    #[error("Snapshot for store '{found}' cannot be loaded into '{expected}'")]
    StoreMismatch { expected: String, found: String },
}

impl SnapshotError {
    /// Create a store mismatch error.
    pub fn store_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::StoreMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
