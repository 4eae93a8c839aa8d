//! Test fixtures for creating reproducible data directories.

use clocks_core::{App, Config};
use clocks_storage::JsonStorage;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary data directory backed by [`JsonStorage`].
///
/// The directory is removed when the fixture is dropped.
///
/// # Example
///
/// ```rust
/// use clocks_test_utils::fixtures::TestDataDir;
///
/// let data = TestDataDir::new().with_snapshot("document", "not json");
/// assert_eq!(data.stored("document").as_deref(), Some("not json"));
/// ```
pub struct TestDataDir {
    temp_dir: TempDir,
}

impl TestDataDir {
    /// Create an empty data directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write raw snapshot text for a store, as if persisted by an earlier run.
    pub fn with_snapshot(self, store: &str, contents: impl AsRef<[u8]>) -> Self {
        let path = self.snapshot_path(store);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create snapshot directory");
        }
        fs::write(&path, contents).expect("Failed to write snapshot");
        self
    }

    /// Write a config file into the data directory.
    pub fn with_config(self, contents: &str) -> Self {
        fs::write(self.path().join("clocks.jsonc"), contents).expect("Failed to write config");
        self
    }

    /// Root of the data directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Where `App::open_dir` keeps snapshots.
    pub fn snapshots_path(&self) -> PathBuf {
        self.path().join("snapshots")
    }

    /// File holding a store's snapshot.
    pub fn snapshot_path(&self, store: &str) -> PathBuf {
        self.snapshots_path().join(format!("{store}.json"))
    }

    /// Persisted snapshot text for a store, if any.
    pub fn stored(&self, store: &str) -> Option<String> {
        fs::read_to_string(self.snapshot_path(store)).ok()
    }

    /// Storage rooted at the snapshots directory.
    pub fn storage(&self) -> JsonStorage {
        JsonStorage::new(self.snapshots_path())
    }

    /// Open an app over this directory with `config`.
    pub async fn open_with(&self, config: Config) -> App {
        App::open(config, Arc::new(self.storage()))
            .await
            .expect("Failed to open app")
    }

    /// Open an app using the directory's config file, if any.
    pub async fn open_app(&self) -> App {
        App::open_dir(self.path()).await.expect("Failed to open app")
    }
}

impl Default for TestDataDir {
    fn default() -> Self {
        Self::new()
    }
}
