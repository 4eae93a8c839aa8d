//! Storage test doubles.

use async_trait::async_trait;
use clocks_storage::{MemoryStorage, Storage, StorageError, StorageResult};
use std::sync::{Arc, Mutex};

/// Storage whose writes always fail.
///
/// Reads are served from an inner [`MemoryStorage`], so a failing backend can
/// still hold snapshots from an earlier run.
#[derive(Debug, Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    attempts: Mutex<usize>,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `value` for `key` on reads.
    pub fn with_entry(key: &[&str], value: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: MemoryStorage::with_entry(key, value),
            attempts: Mutex::new(0),
        }
    }

    /// Number of writes attempted.
    pub fn write_attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn read(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>> {
        self.inner.read(key).await
    }

    async fn write(&self, _key: &[&str], _value: &[u8]) -> StorageResult<()> {
        *self.attempts.lock().unwrap() += 1;
        Err(StorageError::ReadOnly)
    }

    async fn remove(&self, _key: &[&str]) -> StorageResult<()> {
        Err(StorageError::ReadOnly)
    }

    async fn list(&self, prefix: &[&str]) -> StorageResult<Vec<Vec<String>>> {
        self.inner.list(prefix).await
    }

    async fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        self.inner.exists(key).await
    }
}

/// A recorded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub key: Vec<String>,
    pub value: Vec<u8>,
}

impl RecordedWrite {
    /// The written bytes as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

/// Storage that records every write before passing it to memory.
///
/// Clones share the same record, so a test can keep one handle while the
/// app owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingStorage {
    inner: Arc<MemoryStorage>,
    writes: Arc<Mutex<Vec<RecordedWrite>>>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes so far, oldest first.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// Writes made to one key.
    pub fn writes_to(&self, key: &[&str]) -> Vec<RecordedWrite> {
        self.writes()
            .into_iter()
            .filter(|w| w.key.iter().map(String::as_str).eq(key.iter().copied()))
            .collect()
    }

    /// Forget recorded writes. Stored data is kept.
    pub fn clear(&self) {
        self.writes.lock().unwrap().clear();
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn read(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &[&str], value: &[u8]) -> StorageResult<()> {
        self.writes.lock().unwrap().push(RecordedWrite {
            key: key.iter().map(|s| s.to_string()).collect(),
            value: value.to_vec(),
        });
        self.inner.write(key, value).await
    }

    async fn remove(&self, key: &[&str]) -> StorageResult<()> {
        self.inner.remove(key).await
    }

    async fn list(&self, prefix: &[&str]) -> StorageResult<Vec<Vec<String>>> {
        self.inner.list(prefix).await
    }

    async fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        self.inner.exists(key).await
    }
}
