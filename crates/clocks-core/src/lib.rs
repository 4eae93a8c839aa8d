//! Core state and time-travel logic for clocks.
//!
//! Two stores hold all mutable state: the [`Document`] of timezones and the
//! [`ViewState`] tree. Every committed change is snapshotted into a history
//! ledger, persisted, and broadcast to observers tagged with its [`Origin`]:
//! a live user action, or a replay from history.
//!
//! # Architecture
//!
//! ```text
//! App (application root)
//! ├── document: Store<Document>      (timezones by uuid)
//! ├── view_state: Store<ViewState>   (scroll, edit mode, selection, search)
//! ├── ledgers                        (one shared, or one per store)
//! │   ├── HistoryLedger              (snapshots + cursor)
//! │   └── ScrubController            (slider -> seek)
//! └── storage: Arc<dyn Storage>      (persisted snapshots)
//! ```

pub mod app;
pub mod config;
pub mod document;
pub mod error;
pub mod notify;
pub mod store;
pub mod view_state;

pub use app::{App, CombinedSnapshot, Timeline};
pub use config::{Config, HistoryConfig, HistoryMode, PersistenceConfig};
pub use document::{ChangeKind, Document, DocumentChange, DocumentMutation, Timezone};
pub use error::{ConfigError, CoreError, CoreResult};
pub use notify::{ChangeNotification, Notifier, Origin};
pub use store::{Outcome, Store, StoreState};
pub use view_state::{
    DetailViewState, MasterViewState, SelectionViewState, ViewAction, ViewState,
    ViewStateMutation,
};

pub use clocks_history::{DisplayIndex, ScrubRequest, Snapshot};
