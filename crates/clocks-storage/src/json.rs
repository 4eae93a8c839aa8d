//! JSON file-based storage implementation.
//!
//! Each key is stored as a separate file holding the snapshot JSON.
//! Keys are mapped to file paths: `["snapshots", "document"]` -> `snapshots/document.json`

use crate::{validate_key, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// JSON file-based storage.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    base_path: PathBuf,
}

impl JsonStorage {
    /// Create a new JSON storage at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Base directory of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the file path for a key.
    pub fn key_to_path(&self, key: &[&str]) -> StorageResult<PathBuf> {
        validate_key(key)?;

        let mut path = self.base_path.clone();
        for component in key {
            path.push(component);
        }
        path.set_extension("json");

        Ok(path)
    }

    /// Get the directory path for a prefix.
    fn prefix_to_dir(&self, prefix: &[&str]) -> PathBuf {
        let mut path = self.base_path.clone();
        for component in prefix {
            path.push(component);
        }
        path
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn read(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Reading from storage");

        match fs::read(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn write(&self, key: &[&str], value: &[u8]) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), bytes = value.len(), "Writing to storage");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically (write to temp file, then rename)
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value).await?;
        fs::rename(&temp_path, &path).await?;

        Ok(())
    }

    async fn remove(&self, key: &[&str]) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Removing from storage");

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn list(&self, prefix: &[&str]) -> StorageResult<Vec<Vec<String>>> {
        let dir = self.prefix_to_dir(prefix);
        debug!(path = %dir.display(), "Listing storage");

        let mut results = Vec::new();

        match fs::read_dir(&dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();

                    // Only include .json files
                    if path.extension().is_some_and(|ext| ext == "json") {
                        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                            let mut key: Vec<String> =
                                prefix.iter().map(|s| s.to_string()).collect();
                            key.push(stem.to_string());
                            results.push(key);
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::Io(e)),
        }

        results.sort();
        Ok(results)
    }

    async fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}

/// Create a storage instance at the default data directory.
pub fn default_storage() -> Option<JsonStorage> {
    clocks_util::path::data_dir().map(|p| JsonStorage::new(clocks_util::path::snapshots_dir(&p)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage
            .write(&["snapshots", "document"], br#"{"timezones":{}}"#)
            .await
            .unwrap();

        let read = storage.read(&["snapshots", "document"]).await.unwrap();
        assert_eq!(read.as_deref(), Some(&br#"{"timezones":{}}"#[..]));
        assert!(dir.path().join("snapshots/document.json").exists());
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let read = storage.read(&["nonexistent"]).await.unwrap();
        assert_eq!(read, None);
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage.write(&["document"], b"first").await.unwrap();
        storage.write(&["document"], b"second").await.unwrap();

        let read = storage.read(&["document"]).await.unwrap().unwrap();
        assert_eq!(read, b"second");
        assert!(!dir.path().join("document.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage.write(&["document"], b"{}").await.unwrap();
        assert!(storage.exists(&["document"]).await.unwrap());

        storage.remove(&["document"]).await.unwrap();
        assert!(!storage.exists(&["document"]).await.unwrap());

        // Removing again is fine
        storage.remove(&["document"]).await.unwrap();
    }

    #[tokio::test]
    async fn test_list() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage.write(&["snapshots", "document"], b"{}").await.unwrap();
        storage.write(&["snapshots", "view_state"], b"{}").await.unwrap();

        let items = storage.list(&["snapshots"]).await.unwrap();
        assert_eq!(
            items,
            vec![
                vec!["snapshots".to_string(), "document".to_string()],
                vec!["snapshots".to_string(), "view_state".to_string()],
            ]
        );

        assert!(storage.list(&["missing"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        // Empty key
        assert!(storage.write(&[], b"{}").await.is_err());

        // Path traversal attempt
        assert!(storage.write(&["..", "etc", "passwd"], b"{}").await.is_err());

        // Slash in component
        assert!(storage.write(&["path/traversal"], b"{}").await.is_err());
    }
}
