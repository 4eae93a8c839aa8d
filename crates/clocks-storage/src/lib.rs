//! Storage layer for clocks.
//!
//! Stores persist their latest snapshot as a named blob. This crate provides
//! the key-value abstraction behind that and two backends:
//! - JSON file storage (default)
//! - In-memory storage (for testing)

pub mod error;
pub mod json;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use json::JsonStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;

/// A trait for key-value blob storage backends.
///
/// Keys are represented as path segments, e.g., `["document"]` or
/// `["snapshots", "view_state"]`. Values are opaque bytes; callers own the
/// encoding.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a blob from storage.
    ///
    /// Returns `None` if the key doesn't exist.
    async fn read(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>>;

    /// Write a blob to storage, replacing any previous value.
    async fn write(&self, key: &[&str], value: &[u8]) -> StorageResult<()>;

    /// Remove a blob from storage. Removing a missing key is not an error.
    async fn remove(&self, key: &[&str]) -> StorageResult<()>;

    /// List all keys directly under a prefix.
    ///
    /// Returns the full key paths for each item.
    async fn list(&self, prefix: &[&str]) -> StorageResult<Vec<Vec<String>>>;

    /// Check if a key exists.
    async fn exists(&self, key: &[&str]) -> StorageResult<bool>;
}

/// Validate key components: non-empty and free of path traversal.
pub(crate) fn validate_key(key: &[&str]) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key("Key cannot be empty"));
    }

    for component in key {
        if component.is_empty()
            || component.contains('/')
            || component.contains('\\')
            || *component == "."
            || *component == ".."
        {
            return Err(StorageError::invalid_key(format!(
                "Invalid key component: {}",
                component
            )));
        }
    }

    Ok(())
}
