//! Snapshot-capable stores.
//!
//! A [`Store`] holds one value of a [`StoreState`] type. Live mutations go
//! through [`Store::apply`], which reports what changed; history replay goes
//! through [`Store::restore`], which replaces the value wholesale.
//!
//! Stores never notify on their own. The owner decides when to record,
//! persist and fan out, then calls [`Store::notify`].

use crate::notify::{ChangeNotification, Notifier, Origin};
use clocks_history::{Snapshot, SnapshotResult};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// A value that can live in a [`Store`].
pub trait StoreState:
    Serialize + DeserializeOwned + Default + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Store name used in snapshot envelopes and storage keys.
    const NAME: &'static str;

    /// A requested mutation.
    type Mutation: fmt::Debug;

    /// What a successful mutation changed.
    type Change: Clone + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Apply a mutation in place.
    ///
    /// Returns `None` when the mutation does not apply to the current value.
    fn apply(&mut self, mutation: Self::Mutation) -> Option<Self::Change>;
}

/// Result of a store operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<C> {
    /// The value changed as described.
    Changed(C),
    /// Nothing changed.
    NoEffect,
    /// The value was replaced wholesale; observers must refresh everything.
    Reload,
    /// The operation failed and the value is unchanged.
    Error(String),
}

impl<C> Outcome<C> {
    /// Whether the value changed.
    pub fn is_changed(&self) -> bool {
        matches!(self, Outcome::Changed(_))
    }

    /// Whether the operation left the value as it was.
    pub fn is_no_effect(&self) -> bool {
        matches!(self, Outcome::NoEffect)
    }

    /// Whether the value was replaced wholesale.
    pub fn is_reload(&self) -> bool {
        matches!(self, Outcome::Reload)
    }

    /// Whether the operation failed.
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    /// The change, if the value changed.
    pub fn change(&self) -> Option<&C> {
        match self {
            Outcome::Changed(change) => Some(change),
            _ => None,
        }
    }
}

/// Holds one state value plus its latest snapshot.
pub struct Store<S: StoreState> {
    value: Arc<S>,
    /// Snapshot of `value`, refreshed on every change.
    snapshot: Option<Snapshot>,
    notifier: Notifier<S>,
}

impl<S: StoreState> Store<S> {
    /// Create a store holding the default value.
    pub fn new() -> Self {
        Self::with_value(S::default())
    }

    /// Create a store holding `value`.
    pub fn with_value(value: S) -> Self {
        Self {
            value: Arc::new(value),
            snapshot: None,
            notifier: Notifier::default(),
        }
    }

    /// The current value.
    pub fn value(&self) -> &S {
        &self.value
    }

    /// The current value as a shareable handle.
    pub fn shared(&self) -> Arc<S> {
        Arc::clone(&self.value)
    }

    /// Subscribe to this store's notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotification<S>> {
        self.notifier.subscribe()
    }

    /// Publish the current value to subscribers.
    pub fn notify(&self, origin: Origin<S::Change>) -> usize {
        self.notifier.publish(ChangeNotification {
            state: self.shared(),
            origin,
        })
    }

    /// Apply a live mutation.
    ///
    /// The new value is encoded before it is adopted, so a value that cannot
    /// be snapshotted never becomes current.
    pub fn apply(&mut self, mutation: S::Mutation) -> Outcome<S::Change> {
        let _span = clocks_util::store_span!(S::NAME).entered();

        let mut next = (*self.value).clone();
        let Some(change) = next.apply(mutation) else {
            trace!("Mutation had no effect");
            return Outcome::NoEffect;
        };

        if next == *self.value {
            trace!("Mutation left value unchanged");
            return Outcome::NoEffect;
        }

        match Snapshot::encode(S::NAME, &next) {
            Ok(snapshot) => {
                self.value = Arc::new(next);
                self.snapshot = Some(snapshot);
                debug!(%change, "Store changed");
                Outcome::Changed(change)
            }
            Err(e) => {
                warn!(error = %e, "Failed to encode new value, change dropped");
                Outcome::Error(e.to_string())
            }
        }
    }

    /// Replace the value with the one held by `snapshot`.
    ///
    /// Always reports [`Outcome::Reload`]; a snapshot that cannot be decoded
    /// leaves the current value in place.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Outcome<S::Change> {
        let _span = clocks_util::store_span!(S::NAME).entered();

        match snapshot.decode::<S>(S::NAME) {
            Ok(value) => {
                self.value = Arc::new(value);
                self.snapshot = Some(snapshot.clone());
                debug!(bytes = snapshot.len(), "Store restored");
            }
            Err(e) => {
                warn!(error = %e, "Failed to restore snapshot, keeping current value");
            }
        }
        Outcome::Reload
    }

    /// Snapshot of the current value.
    pub fn current_snapshot(&self) -> SnapshotResult<Snapshot> {
        match &self.snapshot {
            Some(snapshot) => Ok(snapshot.clone()),
            None => Snapshot::encode(S::NAME, &*self.value),
        }
    }

    /// Adopt an initial snapshot, e.g. one read from storage.
    ///
    /// Falls back to the default value when there is no snapshot or it cannot
    /// be decoded. Returns whether the snapshot was adopted.
    pub fn load(&mut self, snapshot: Option<&Snapshot>) -> bool {
        let _span = clocks_util::store_span!(S::NAME).entered();

        let Some(snapshot) = snapshot else {
            debug!("No stored snapshot, starting empty");
            self.value = Arc::new(S::default());
            self.snapshot = None;
            return false;
        };

        match snapshot.decode::<S>(S::NAME) {
            Ok(value) => {
                self.value = Arc::new(value);
                self.snapshot = Some(snapshot.clone());
                debug!(bytes = snapshot.len(), "Loaded stored snapshot");
                true
            }
            Err(e) => {
                warn!(error = %e, "Stored snapshot unreadable, starting empty");
                self.value = Arc::new(S::default());
                self.snapshot = None;
                false
            }
        }
    }
}

impl<S: StoreState> Default for Store<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StoreState> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &S::NAME)
            .field("value", &self.value)
            .finish()
    }
}
