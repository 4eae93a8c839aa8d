//! Time-travel history for clocks.
//!
//! This crate provides the pieces that make state history navigable:
//! - A schema-versioned, immutable snapshot format
//! - A bounded undo/redo ledger with a cursor
//! - A scrub controller that turns slider positions into discrete seeks
//!
//! # Example
//!
//! ```
//! use clocks_history::{HistoryLedger, ScrubController, ScrubRequest, Snapshot};
//!
//! let mut ledger = HistoryLedger::new(100);
//! for n in 0..4 {
//!     let snapshot = Snapshot::encode("counter", &n).unwrap();
//!     ledger.push(format!("set {n}"), snapshot);
//! }
//!
//! let mut scrub = ScrubController::new();
//! let request = scrub.input(0.3, ledger.current_display_index());
//! assert_eq!(request, Some(ScrubRequest::Seek(1)));
//!
//! let viewed: i32 = ledger.seek(1).unwrap().decode("counter").unwrap();
//! assert_eq!(viewed, 1);
//! ```

mod error;
mod ledger;
mod scrub;
mod snapshot;

pub use error::{SnapshotError, SnapshotResult};
pub use ledger::{DisplayIndex, HistoryLedger, LedgerEntry, DEFAULT_MAX_ENTRIES};
pub use scrub::{quantize, ScrubController, ScrubRequest};
pub use snapshot::{Snapshot, SCHEMA_VERSION};
