//! Snapshot data structures.
//!
//! A snapshot is the complete state of one store at one instant, encoded as a
//! JSON envelope:
//!
//! ```text
//! {
//!   "schema_version": 1,
//!   "store": "document",
//!   "content": { ... }
//! }
//! ```
//!
//! Unknown fields are ignored on decode and missing fields fall back to the
//! content type's defaults, so older and partial snapshots still load.

use crate::{SnapshotError, SnapshotResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Current snapshot schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Immutable, cheaply clonable snapshot bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Snapshot {
    bytes: Arc<[u8]>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    schema_version: u32,
    store: &'a str,
    content: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    schema_version: u32,
    #[serde(default)]
    store: String,
    #[serde(default)]
    content: serde_json::Value,
}

impl Snapshot {
    /// Encode a store value into a snapshot.
    pub fn encode<T: Serialize>(store: &str, content: &T) -> SnapshotResult<Self> {
        let envelope = EnvelopeRef {
            schema_version: SCHEMA_VERSION,
            store,
            content,
        };
        let bytes = serde_json::to_vec_pretty(&envelope)?;
        Ok(Self::from_bytes(bytes))
    }

    /// Decode the store value held by this snapshot.
    ///
    /// `store` must match the name the snapshot was encoded with; an envelope
    /// without a store name is accepted for any store.
    pub fn decode<T: DeserializeOwned>(&self, store: &str) -> SnapshotResult<T> {
        let envelope: Envelope = serde_json::from_slice(&self.bytes)?;

        if envelope.schema_version > SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: envelope.schema_version,
                supported: SCHEMA_VERSION,
            });
        }

        if !envelope.store.is_empty() && envelope.store != store {
            return Err(SnapshotError::store_mismatch(store, envelope.store));
        }

        let content = match envelope.content {
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            other => other,
        };

        Ok(serde_json::from_value(content)?)
    }

    /// Wrap raw bytes (e.g. read from storage) without validating them.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
        }
    }

    /// The encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the encoded snapshot in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the snapshot holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The snapshot as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        names: BTreeMap<String, String>,
        offset: f64,
        editing: bool,
        selection: Option<String>,
    }

    fn sample() -> Sample {
        let mut names = BTreeMap::new();
        names.insert("a".to_string(), "Tokyo".to_string());
        Sample {
            names,
            offset: 12.5,
            editing: true,
            selection: Some("a".to_string()),
        }
    }

    #[test]
    fn test_encode_decode() {
        let snapshot = Snapshot::encode("sample", &sample()).unwrap();
        let decoded: Sample = snapshot.decode("sample").unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_encode_decode_preserves_every_offset() {
        let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut checked = 0;
        while checked < 10_000 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let offset = f64::from_bits(state);
            if !offset.is_finite() {
                continue;
            }
            checked += 1;

            let value = Sample {
                offset,
                ..sample()
            };
            let snapshot = Snapshot::encode("sample", &value).unwrap();
            let decoded: Sample = snapshot.decode("sample").unwrap();
            assert_eq!(
                decoded.offset.to_bits(),
                offset.to_bits(),
                "offset {offset:e} changed after decode"
            );
            assert_eq!(Snapshot::encode("sample", &decoded).unwrap(), snapshot);
        }
    }

    #[test]
    fn test_envelope_is_readable_json() {
        let snapshot = Snapshot::encode("sample", &sample()).unwrap();
        let text = snapshot.as_str().unwrap();
        assert!(text.contains("\"schema_version\": 1"));
        assert!(text.contains("\"store\": \"sample\""));
        assert!(text.contains("\"Tokyo\""));
    }

    #[test]
    fn test_missing_fields_default() {
        let snapshot = Snapshot::from_bytes(r#"{"content": {"editing": true, "extra": 3}}"#);
        let decoded: Sample = snapshot.decode("sample").unwrap();
        assert!(decoded.editing);
        assert!(decoded.names.is_empty());
        assert_eq!(decoded.offset, 0.0);
        assert_eq!(decoded.selection, None);
    }

    #[test]
    fn test_missing_content_decodes_default() {
        let snapshot = Snapshot::from_bytes(r#"{"schema_version": 1, "store": "sample"}"#);
        let decoded: Sample = snapshot.decode("sample").unwrap();
        assert_eq!(decoded, Sample::default());
    }

    #[test]
    fn test_corrupt_bytes_fail() {
        let snapshot = Snapshot::from_bytes("not json {");
        let result: SnapshotResult<Sample> = snapshot.decode("sample");
        assert!(matches!(result, Err(SnapshotError::Serialization(_))));
    }

    #[test]
    fn test_newer_schema_rejected() {
        let snapshot = Snapshot::from_bytes(r#"{"schema_version": 99, "content": {}}"#);
        let result: SnapshotResult<Sample> = snapshot.decode("sample");
        assert!(matches!(
            result,
            Err(SnapshotError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_store_mismatch_rejected() {
        let snapshot = Snapshot::encode("document", &sample()).unwrap();
        let result: SnapshotResult<Sample> = snapshot.decode("view_state");
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Snapshot for store 'document' cannot be loaded into 'view_state'"
        );
    }

    #[test]
    fn test_clone_shares_bytes() {
        let snapshot = Snapshot::encode("sample", &sample()).unwrap();
        let copy = snapshot.clone();
        assert_eq!(snapshot, copy);
        assert_eq!(snapshot.as_bytes().as_ptr(), copy.as_bytes().as_ptr());
    }
}
