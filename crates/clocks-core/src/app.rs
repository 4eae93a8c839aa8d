//! Application root.
//!
//! [`App`] owns both stores, their history and the storage backend. It is the
//! single place where a store outcome is classified:
//!
//! - `Changed`: record in history, persist, notify with `Origin::UserAction`.
//!   A change made while a shared timeline is viewing history persists both
//!   stores, since the restored value of the other store becomes live.
//! - `Reload` (from seek, scrub, undo, redo): notify with `Origin::Replay`
//! - `NoEffect` / `Error`: nothing is recorded or published
//!
//! # Example
//!
//! ```ignore
//! let storage = Arc::new(MemoryStorage::new());
//! let mut app = App::open(Config::default(), storage).await?;
//!
//! let mut rx = app.subscribe_document();
//! app.apply_document(DocumentMutation::add("Europe/Paris")).await;
//!
//! let notification = rx.recv().await?;
//! assert!(notification.origin.is_user_action());
//! ```

use crate::config::{Config, HistoryMode};
use crate::document::{Document, DocumentChange, DocumentMutation};
use crate::error::CoreResult;
use crate::notify::{ChangeNotification, Origin};
use crate::store::{Outcome, Store, StoreState};
use crate::view_state::{ViewAction, ViewState, ViewStateMutation};
use clocks_history::{
    DisplayIndex, HistoryLedger, ScrubController, ScrubRequest, Snapshot, SnapshotResult,
};
use clocks_storage::{JsonStorage, Storage};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

/// Label of the ledger entry seeded from storage at startup.
const RESTORED_LABEL: &str = "Restored";

/// Addresses one history ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeline {
    /// The combined ledger of [`HistoryMode::Shared`].
    Shared,
    /// The document ledger of [`HistoryMode::PerStore`].
    Document,
    /// The view-state ledger of [`HistoryMode::PerStore`].
    ViewState,
}

/// Both stores captured at the same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedSnapshot {
    pub document: Snapshot,
    pub view_state: Snapshot,
}

/// A ledger and the scrubber driving it.
#[derive(Debug)]
struct Track<T> {
    ledger: HistoryLedger<T>,
    scrub: ScrubController,
}

impl<T: Clone> Track<T> {
    fn new(max_entries: usize) -> Self {
        Self {
            ledger: HistoryLedger::new(max_entries),
            scrub: ScrubController::new(),
        }
    }

    fn scrub_input(&mut self, fraction: f64) -> Option<ScrubRequest> {
        let display = self.ledger.current_display_index();
        self.scrub.input(fraction, display)
    }

    /// Move the ledger, returning the snapshot to replay if it moved.
    fn navigate(&mut self, navigation: Navigation) -> Option<T> {
        match navigation {
            Navigation::Seek(index) => self.ledger.seek(index).cloned(),
            Navigation::ReturnToTip => {
                if self.ledger.is_at_tip() {
                    return None;
                }
                self.ledger.return_to_tip().cloned()
            }
            Navigation::Undo => self.ledger.undo().cloned(),
            Navigation::Redo => self.ledger.redo().cloned(),
        }
    }
}

#[derive(Debug)]
enum Ledgers {
    Shared(Track<CombinedSnapshot>),
    PerStore {
        document: Track<Snapshot>,
        view_state: Track<Snapshot>,
    },
}

#[derive(Debug, Clone, Copy)]
enum Navigation {
    Seek(usize),
    ReturnToTip,
    Undo,
    Redo,
}

impl From<ScrubRequest> for Navigation {
    fn from(request: ScrubRequest) -> Self {
        match request {
            ScrubRequest::Seek(index) => Navigation::Seek(index),
            ScrubRequest::ReturnToTip => Navigation::ReturnToTip,
        }
    }
}

/// What a history move restores.
enum Replay {
    Both(CombinedSnapshot),
    Document(Snapshot),
    ViewState(Snapshot),
}

/// Owns all application state.
pub struct App {
    config: Config,
    storage: Arc<dyn Storage>,
    document: Store<Document>,
    view_state: Store<ViewState>,
    ledgers: Ledgers,
}

impl App {
    /// Rehydrate both stores from storage and seed history.
    ///
    /// A store whose persisted snapshot is missing or unreadable starts
    /// empty; only stores that adopted a snapshot seed a ledger entry. No
    /// notifications are published.
    pub async fn open(config: Config, storage: Arc<dyn Storage>) -> CoreResult<Self> {
        config.validate()?;

        let mut document = Store::new();
        let document_loaded = if config.persistence.document {
            document.load(read_snapshot::<Document>(storage.as_ref()).await.as_ref())
        } else {
            false
        };

        let mut view_state = Store::new();
        let view_state_loaded = if config.persistence.view_state {
            view_state.load(read_snapshot::<ViewState>(storage.as_ref()).await.as_ref())
        } else {
            false
        };

        let max_entries = config.history.max_entries;
        let ledgers = match config.history.mode {
            HistoryMode::Shared => {
                let mut track = Track::new(max_entries);
                if document_loaded || view_state_loaded {
                    match combined_snapshot(&document, &view_state) {
                        Ok(snapshot) => track.ledger.push(RESTORED_LABEL, snapshot),
                        Err(e) => warn!(error = %e, "Failed to seed history"),
                    }
                }
                Ledgers::Shared(track)
            }
            HistoryMode::PerStore => Ledgers::PerStore {
                document: seeded_track(&document, document_loaded, max_entries),
                view_state: seeded_track(&view_state, view_state_loaded, max_entries),
            },
        };

        info!(
            mode = ?config.history.mode,
            timezones = document.value().len(),
            document_loaded,
            view_state_loaded,
            "Opened clocks state"
        );

        Ok(Self {
            config,
            storage,
            document,
            view_state,
            ledgers,
        })
    }

    /// Open with the configuration found in `dir`, persisting snapshots
    /// under `dir/snapshots`.
    pub async fn open_dir(dir: &Path) -> CoreResult<Self> {
        let (config, _) = Config::load(dir).await?;
        let storage = JsonStorage::new(clocks_util::path::snapshots_dir(dir));
        Self::open(config, Arc::new(storage)).await
    }

    /// Open with the user's config directory and the default data directory.
    pub async fn open_default() -> CoreResult<Self> {
        let config = match clocks_util::path::config_dir() {
            Some(dir) => Config::load(&dir).await?.0,
            None => Config::default(),
        };
        let storage = clocks_storage::json::default_storage().unwrap_or_else(|| {
            warn!("No data directory available, using ./.clocks");
            JsonStorage::new(clocks_util::path::snapshots_dir(Path::new(".clocks")))
        });
        Self::open(config, Arc::new(storage)).await
    }

    /// Apply a live document mutation.
    pub async fn apply_document(&mut self, mutation: DocumentMutation) -> Outcome<DocumentChange> {
        let outcome = self.document.apply(mutation);
        let Outcome::Changed(change) = &outcome else {
            trace!(store = Document::NAME, ?outcome, "Nothing to record");
            return outcome;
        };

        let branched = self.record(Timeline::Document, &change.to_string());
        self.persist_commit(Timeline::Document, branched).await;
        self.document.notify(Origin::UserAction(change.clone()));
        outcome
    }

    /// Apply a live view-state mutation.
    pub async fn apply_view_state(&mut self, mutation: ViewStateMutation) -> Outcome<ViewAction> {
        let outcome = self.view_state.apply(mutation);
        let Outcome::Changed(action) = &outcome else {
            trace!(store = ViewState::NAME, ?outcome, "Nothing to record");
            return outcome;
        };

        let branched = self.record(Timeline::ViewState, &action.to_string());
        self.persist_commit(Timeline::ViewState, branched).await;
        self.view_state.notify(Origin::UserAction(*action));
        outcome
    }

    /// View the entry at `index`. Returns whether anything was replayed.
    pub fn seek(&mut self, timeline: Timeline, index: usize) -> bool {
        self.navigate(timeline, Navigation::Seek(index))
    }

    /// Go back to the live state. Returns `false` when already there.
    pub fn return_to_tip(&mut self, timeline: Timeline) -> bool {
        self.navigate(timeline, Navigation::ReturnToTip)
    }

    /// Step one entry back.
    pub fn undo(&mut self, timeline: Timeline) -> bool {
        self.navigate(timeline, Navigation::Undo)
    }

    /// Step one entry forward.
    pub fn redo(&mut self, timeline: Timeline) -> bool {
        self.navigate(timeline, Navigation::Redo)
    }

    /// Feed a scrub slider position and carry out the resulting request.
    pub fn scrub(&mut self, timeline: Timeline, fraction: f64) -> Option<ScrubRequest> {
        let request = match (&mut self.ledgers, timeline) {
            (Ledgers::Shared(track), Timeline::Shared) => track.scrub_input(fraction),
            (Ledgers::PerStore { document, .. }, Timeline::Document) => {
                document.scrub_input(fraction)
            }
            (Ledgers::PerStore { view_state, .. }, Timeline::ViewState) => {
                view_state.scrub_input(fraction)
            }
            _ => {
                unavailable(timeline, self.config.history.mode);
                return None;
            }
        }?;

        self.navigate(timeline, request.into());
        Some(request)
    }

    /// Where a timeline's ledger is positioned.
    pub fn display_index(&self, timeline: Timeline) -> Option<DisplayIndex> {
        match (&self.ledgers, timeline) {
            (Ledgers::Shared(track), Timeline::Shared) => Some(track.ledger.current_display_index()),
            (Ledgers::PerStore { document, .. }, Timeline::Document) => {
                Some(document.ledger.current_display_index())
            }
            (Ledgers::PerStore { view_state, .. }, Timeline::ViewState) => {
                Some(view_state.ledger.current_display_index())
            }
            _ => None,
        }
    }

    /// Labels of a timeline's entries, oldest first.
    pub fn labels(&self, timeline: Timeline) -> Option<Vec<String>> {
        fn collect<T>(ledger: &HistoryLedger<T>) -> Vec<String> {
            ledger.entries().iter().map(|e| e.label.clone()).collect()
        }

        match (&self.ledgers, timeline) {
            (Ledgers::Shared(track), Timeline::Shared) => Some(collect(&track.ledger)),
            (Ledgers::PerStore { document, .. }, Timeline::Document) => {
                Some(collect(&document.ledger))
            }
            (Ledgers::PerStore { view_state, .. }, Timeline::ViewState) => {
                Some(collect(&view_state.ledger))
            }
            _ => None,
        }
    }

    /// Whether `undo` would move.
    pub fn can_undo(&self, timeline: Timeline) -> bool {
        match (&self.ledgers, timeline) {
            (Ledgers::Shared(track), Timeline::Shared) => track.ledger.can_undo(),
            (Ledgers::PerStore { document, .. }, Timeline::Document) => document.ledger.can_undo(),
            (Ledgers::PerStore { view_state, .. }, Timeline::ViewState) => {
                view_state.ledger.can_undo()
            }
            _ => false,
        }
    }

    /// Whether `redo` would move.
    pub fn can_redo(&self, timeline: Timeline) -> bool {
        match (&self.ledgers, timeline) {
            (Ledgers::Shared(track), Timeline::Shared) => track.ledger.can_redo(),
            (Ledgers::PerStore { document, .. }, Timeline::Document) => document.ledger.can_redo(),
            (Ledgers::PerStore { view_state, .. }, Timeline::ViewState) => {
                view_state.ledger.can_redo()
            }
            _ => false,
        }
    }

    /// Timelines that exist in the configured history mode.
    pub fn timelines(&self) -> &'static [Timeline] {
        match self.ledgers {
            Ledgers::Shared(_) => &[Timeline::Shared],
            Ledgers::PerStore { .. } => &[Timeline::Document, Timeline::ViewState],
        }
    }

    pub fn document(&self) -> &Document {
        self.document.value()
    }

    pub fn view_state(&self) -> &ViewState {
        self.view_state.value()
    }

    pub fn subscribe_document(&self) -> broadcast::Receiver<ChangeNotification<Document>> {
        self.document.subscribe()
    }

    pub fn subscribe_view_state(&self) -> broadcast::Receiver<ChangeNotification<ViewState>> {
        self.view_state.subscribe()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Push the current state after a change to `source`.
    ///
    /// Returns whether a shared ledger was viewing history, in which case the
    /// new tip also adopts the other store's restored value.
    fn record(&mut self, source: Timeline, label: &str) -> bool {
        match &mut self.ledgers {
            Ledgers::Shared(track) => {
                let branched = !track.ledger.is_at_tip();
                match combined_snapshot(&self.document, &self.view_state) {
                    Ok(snapshot) => {
                        trace!(
                            document = snapshot.document.as_str().unwrap_or_default(),
                            view_state = snapshot.view_state.as_str().unwrap_or_default(),
                            branched,
                            "Recording snapshot"
                        );
                        track.ledger.push(label, snapshot);
                    }
                    Err(e) => warn!(error = %e, label, "Failed to record history entry"),
                }
                branched
            }
            Ledgers::PerStore {
                document,
                view_state,
            } => {
                let (track, snapshot) = match source {
                    Timeline::ViewState => (view_state, self.view_state.current_snapshot()),
                    _ => (document, self.document.current_snapshot()),
                };
                match snapshot {
                    Ok(snapshot) => {
                        trace!(
                            snapshot = snapshot.as_str().unwrap_or_default(),
                            "Recording snapshot"
                        );
                        track.ledger.push(label, snapshot);
                    }
                    Err(e) => warn!(error = %e, label, "Failed to record history entry"),
                }
                false
            }
        }
    }

    /// Write the stores a commit to `source` changed on disk.
    ///
    /// A branched shared commit makes both restored values live, so both are
    /// written.
    async fn persist_commit(&self, source: Timeline, branched: bool) {
        let persistence = &self.config.persistence;
        let storage = self.storage.as_ref();
        if persistence.document && (branched || source == Timeline::Document) {
            persist(storage, &self.document).await;
        }
        if persistence.view_state && (branched || source == Timeline::ViewState) {
            persist(storage, &self.view_state).await;
        }
    }

    fn navigate(&mut self, timeline: Timeline, navigation: Navigation) -> bool {
        let replay = match (&mut self.ledgers, timeline) {
            (Ledgers::Shared(track), Timeline::Shared) => track.navigate(navigation).map(Replay::Both),
            (Ledgers::PerStore { document, .. }, Timeline::Document) => {
                document.navigate(navigation).map(Replay::Document)
            }
            (Ledgers::PerStore { view_state, .. }, Timeline::ViewState) => {
                view_state.navigate(navigation).map(Replay::ViewState)
            }
            _ => {
                unavailable(timeline, self.config.history.mode);
                return false;
            }
        };

        match replay {
            Some(replay) => {
                debug!(?timeline, ?navigation, "Replaying history");
                self.replay(replay);
                true
            }
            None => {
                debug!(?timeline, ?navigation, "History did not move");
                false
            }
        }
    }

    /// Restore and notify, document before view state.
    fn replay(&mut self, replay: Replay) {
        match replay {
            Replay::Both(snapshot) => {
                self.document.restore(&snapshot.document);
                self.view_state.restore(&snapshot.view_state);
                self.document.notify(Origin::Replay);
                self.view_state.notify(Origin::Replay);
            }
            Replay::Document(snapshot) => {
                self.document.restore(&snapshot);
                self.document.notify(Origin::Replay);
            }
            Replay::ViewState(snapshot) => {
                self.view_state.restore(&snapshot);
                self.view_state.notify(Origin::Replay);
            }
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("document", &self.document)
            .field("view_state", &self.view_state)
            .field("ledgers", &self.ledgers)
            .finish_non_exhaustive()
    }
}

fn unavailable(timeline: Timeline, mode: HistoryMode) {
    warn!(?timeline, ?mode, "Timeline not available");
}

fn combined_snapshot(
    document: &Store<Document>,
    view_state: &Store<ViewState>,
) -> SnapshotResult<CombinedSnapshot> {
    Ok(CombinedSnapshot {
        document: document.current_snapshot()?,
        view_state: view_state.current_snapshot()?,
    })
}

fn seeded_track<S: StoreState>(store: &Store<S>, loaded: bool, max_entries: usize) -> Track<Snapshot> {
    let mut track = Track::new(max_entries);
    if loaded {
        match store.current_snapshot() {
            Ok(snapshot) => track.ledger.push(RESTORED_LABEL, snapshot),
            Err(e) => warn!(store = S::NAME, error = %e, "Failed to seed history"),
        }
    }
    track
}

async fn read_snapshot<S: StoreState>(storage: &dyn Storage) -> Option<Snapshot> {
    match storage.read(&[S::NAME]).await {
        Ok(bytes) => bytes.map(Snapshot::from_bytes),
        Err(e) => {
            warn!(store = S::NAME, error = %e, "Failed to read stored snapshot");
            None
        }
    }
}

/// Write a store's snapshot. Failures are logged, never propagated.
async fn persist<S: StoreState>(storage: &dyn Storage, store: &Store<S>) {
    let snapshot = match store.current_snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(store = S::NAME, error = %e, "Failed to snapshot store for persistence");
            return;
        }
    };

    match storage.write(&[S::NAME], snapshot.as_bytes()).await {
        Ok(()) => trace!(store = S::NAME, bytes = snapshot.len(), "Persisted snapshot"),
        Err(e) => warn!(store = S::NAME, error = %e, "Failed to persist snapshot"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clocks_storage::MemoryStorage;

    async fn open(mode: HistoryMode) -> App {
        let mut config = Config::default();
        config.history.mode = mode;
        App::open(config, Arc::new(MemoryStorage::new())).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_empty() {
        let app = open(HistoryMode::Shared).await;
        assert!(app.document().is_empty());
        assert_eq!(app.view_state(), &ViewState::default());
        assert_eq!(app.display_index(Timeline::Shared), Some(DisplayIndex::default()));
        assert_eq!(app.timelines(), &[Timeline::Shared]);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let mut config = Config::default();
        config.history.max_entries = 0;
        assert!(App::open(config, Arc::new(MemoryStorage::new())).await.is_err());
    }

    #[tokio::test]
    async fn test_shared_records_both_stores() {
        let mut app = open(HistoryMode::Shared).await;
        app.apply_document(DocumentMutation::add("Asia/Tokyo")).await;
        app.apply_view_state(ViewStateMutation::ToggleEditMode).await;

        assert_eq!(
            app.labels(Timeline::Shared),
            Some(vec!["Insert Tokyo".to_string(), "Toggle edit mode".to_string()])
        );
        assert_eq!(app.display_index(Timeline::Shared).unwrap().to_string(), "2 / 2");
    }

    #[tokio::test]
    async fn test_no_effect_not_recorded() {
        let mut app = open(HistoryMode::Shared).await;
        let outcome = app.apply_view_state(ViewStateMutation::ScrollMaster(0.0)).await;
        assert!(outcome.is_no_effect());
        assert_eq!(app.display_index(Timeline::Shared).unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_unavailable_timeline() {
        let mut app = open(HistoryMode::Shared).await;
        app.apply_view_state(ViewStateMutation::ToggleEditMode).await;

        assert!(!app.seek(Timeline::Document, 0));
        assert_eq!(app.scrub(Timeline::ViewState, 0.0), None);
        assert_eq!(app.display_index(Timeline::Document), None);
        assert!(!app.can_undo(Timeline::ViewState));
    }

    #[tokio::test]
    async fn test_per_store_timelines_are_independent() {
        let mut app = open(HistoryMode::PerStore).await;
        app.apply_document(DocumentMutation::add("Asia/Tokyo")).await;
        app.apply_document(DocumentMutation::add("Europe/Paris")).await;
        app.apply_view_state(ViewStateMutation::ToggleEditMode).await;

        assert_eq!(app.display_index(Timeline::Document).unwrap().count, 2);
        assert_eq!(app.display_index(Timeline::ViewState).unwrap().count, 1);
        assert_eq!(app.display_index(Timeline::Shared), None);

        assert!(app.undo(Timeline::Document));
        assert_eq!(app.document().len(), 1);
        assert!(app.view_state().master_view.is_editing);
    }

    #[tokio::test]
    async fn test_return_to_tip_at_tip_does_nothing() {
        let mut app = open(HistoryMode::Shared).await;
        app.apply_view_state(ViewStateMutation::ToggleEditMode).await;
        let mut rx = app.subscribe_view_state();

        assert!(!app.return_to_tip(Timeline::Shared));
        assert!(rx.try_recv().is_err());
    }
}
