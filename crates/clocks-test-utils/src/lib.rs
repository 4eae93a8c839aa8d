//! Testing utilities, fixtures, and mocks for clocks.
//!
//! - **Fixtures**: temporary data directories with real JSON storage
//! - **Mocks**: storage backends that fail or record writes
//! - **Builders**: documents and persisted snapshots
//! - **Assertions**: helpers for draining and checking change notifications
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use clocks_test_utils::{fixtures::TestDataDir, assertions::expect_user_action};
//!
//! #[tokio::test]
//! async fn test_add_persists() {
//!     let data = TestDataDir::new();
//!     let mut app = data.open_app().await;
//!     let mut rx = app.subscribe_document();
//!
//!     app.apply_document(DocumentMutation::add("Asia/Tokyo")).await;
//!
//!     expect_user_action(&mut rx);
//!     assert!(data.stored("document").is_some());
//! }
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used items
pub use builders::DocumentBuilder;
pub use fixtures::TestDataDir;
pub use mocks::{FailingStorage, RecordingStorage};
