//! Builders for test documents and snapshots.

use clocks_core::{Document, StoreState, Timezone, ViewState};
use clocks_history::Snapshot;
use uuid::Uuid;

/// Builder for documents with predictable uuids.
///
/// # Example
///
/// ```rust
/// use clocks_test_utils::builders::DocumentBuilder;
///
/// let document = DocumentBuilder::new()
///     .timezone("Asia/Tokyo")
///     .named("Europe/Paris", "Office")
///     .build();
///
/// assert_eq!(document.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
    next_id: u128,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uuid the n-th added timezone gets (starting at 1).
    pub fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    /// Add a timezone with its default name.
    pub fn timezone(mut self, identifier: &str) -> Self {
        self.next_id += 1;
        let uuid = Self::uuid(self.next_id);
        self.document
            .timezones
            .insert(uuid, Timezone::new(uuid, identifier));
        self
    }

    /// Add a timezone with a custom name.
    pub fn named(mut self, identifier: &str, name: &str) -> Self {
        self.next_id += 1;
        let uuid = Self::uuid(self.next_id);
        let mut timezone = Timezone::new(uuid, identifier);
        timezone.name = name.to_string();
        self.document.timezones.insert(uuid, timezone);
        self
    }

    pub fn build(self) -> Document {
        self.document
    }

    /// Encoded snapshot bytes, as the app persists them.
    pub fn snapshot_bytes(self) -> Vec<u8> {
        encode(&self.document)
    }
}

/// Encoded snapshot bytes for a view state.
pub fn view_state_bytes(view_state: &ViewState) -> Vec<u8> {
    encode(view_state)
}

fn encode<S: StoreState>(value: &S) -> Vec<u8> {
    Snapshot::encode(S::NAME, value)
        .expect("Failed to encode snapshot")
        .as_bytes()
        .to_vec()
}
