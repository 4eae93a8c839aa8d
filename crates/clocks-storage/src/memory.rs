//! In-memory storage implementation for testing.

use crate::{validate_key, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing.
///
/// This stores all data in memory and is not persistent.
#[derive(Debug)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Create a storage pre-populated with one blob.
    pub fn with_entry(key: &[&str], value: impl Into<Vec<u8>>) -> Self {
        let storage = Self::new();
        if let Ok(mut data) = storage.data.write() {
            data.insert(Self::key_to_string(key), value.into());
        }
        storage
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert a key slice to a storage key string.
    fn key_to_string(key: &[&str]) -> String {
        key.join("/")
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        Ok(data.get(&Self::key_to_string(key)).cloned())
    }

    async fn write(&self, key: &[&str], value: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.insert(Self::key_to_string(key), value.to_vec());

        Ok(())
    }

    async fn remove(&self, key: &[&str]) -> StorageResult<()> {
        validate_key(key)?;
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.remove(&Self::key_to_string(key));
        Ok(())
    }

    async fn list(&self, prefix: &[&str]) -> StorageResult<Vec<Vec<String>>> {
        let prefix_str = Self::key_to_string(prefix);
        let prefix_with_sep = if prefix_str.is_empty() {
            String::new()
        } else {
            format!("{prefix_str}/")
        };

        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        let mut results: Vec<Vec<String>> = data
            .keys()
            .filter_map(|k| {
                let remainder = k.strip_prefix(&prefix_with_sep)?;

                // Only include direct children (one level deep)
                if remainder.contains('/') {
                    return None;
                }

                Some(k.split('/').map(|s| s.to_string()).collect())
            })
            .collect();

        results.sort();
        Ok(results)
    }

    async fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        validate_key(key)?;
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(data.contains_key(&Self::key_to_string(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();

        storage.write(&["snapshots", "document"], b"{}").await.unwrap();

        let read = storage.read(&["snapshots", "document"]).await.unwrap();
        assert_eq!(read, Some(b"{}".to_vec()));

        assert!(storage.exists(&["snapshots", "document"]).await.unwrap());
        assert!(!storage.exists(&["nonexistent"]).await.unwrap());

        storage.remove(&["snapshots", "document"]).await.unwrap();
        assert!(!storage.exists(&["snapshots", "document"]).await.unwrap());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_with_entry() {
        let storage = MemoryStorage::with_entry(&["document"], "corrupt");
        assert_eq!(storage.len(), 1);
        let read = storage.read(&["document"]).await.unwrap();
        assert_eq!(read, Some(b"corrupt".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_storage_list_excludes_nested() {
        let storage = MemoryStorage::new();

        storage.write(&["snapshots", "document"], b"{}").await.unwrap();
        storage
            .write(&["snapshots", "archive", "document"], b"{}")
            .await
            .unwrap();
        storage.write(&["other"], b"{}").await.unwrap();

        let items = storage.list(&["snapshots"]).await.unwrap();
        assert_eq!(items, vec![vec!["snapshots", "document"]]);

        let top = storage.list(&[]).await.unwrap();
        assert_eq!(top, vec![vec!["other"]]);
    }

    #[tokio::test]
    async fn test_memory_storage_rejects_traversal() {
        let storage = MemoryStorage::new();
        assert!(storage.write(&[".."], b"{}").await.is_err());
        assert!(storage.read(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_storage_overwrite() {
        let storage = MemoryStorage::new();

        storage.write(&["key"], b"first").await.unwrap();
        storage.write(&["key"], b"second").await.unwrap();

        let result = storage.read(&["key"]).await.unwrap();
        assert_eq!(result.unwrap(), b"second");
    }
}
