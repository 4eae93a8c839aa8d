//! Typed change notifications.
//!
//! Each store owns a broadcast channel of [`ChangeNotification`]s. Observers
//! subscribe per store and match on the [`Origin`] to decide how to react:
//!
//! - `Origin::UserAction(change)`: apply the fine-grained change, animated
//! - `Origin::Replay`: assume everything changed and refresh without animation
//!
//! A receiver that falls too far behind gets `RecvError::Lagged` from tokio;
//! it should treat that like a replay and refresh from `state`.

use crate::store::StoreState;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// Where a state transition came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin<C> {
    /// A live mutation; carries what changed.
    UserAction(C),
    /// State restored from history (scrub, undo/redo).
    Replay,
}

impl<C> Origin<C> {
    /// Whether this was a live mutation.
    pub fn is_user_action(&self) -> bool {
        matches!(self, Origin::UserAction(_))
    }

    /// Whether this was restored from history.
    pub fn is_replay(&self) -> bool {
        matches!(self, Origin::Replay)
    }

    /// Only user actions animate; replays jump straight to the restored state.
    pub fn should_animate(&self) -> bool {
        self.is_user_action()
    }

    /// The fine-grained change, for user actions.
    pub fn change(&self) -> Option<&C> {
        match self {
            Origin::UserAction(change) => Some(change),
            Origin::Replay => None,
        }
    }
}

/// A store's new value plus where the change came from.
#[derive(Debug, Clone)]
pub struct ChangeNotification<S: StoreState> {
    /// The store value after the change.
    pub state: Arc<S>,
    /// A user action carrying its change, or a history replay.
    pub origin: Origin<S::Change>,
}

/// Broadcasts notifications for one store.
#[derive(Debug)]
pub struct Notifier<S: StoreState> {
    sender: broadcast::Sender<ChangeNotification<S>>,
}

impl<S: StoreState> Notifier<S> {
    /// Create a notifier whose receivers buffer up to `capacity` notifications.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to future notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotification<S>> {
        self.sender.subscribe()
    }

    /// Publish to all current subscribers, returning how many received it.
    pub fn publish(&self, notification: ChangeNotification<S>) -> usize {
        let user_action = notification.origin.is_user_action();
        // Sending with no subscribers is not an error
        let delivered = self.sender.send(notification).unwrap_or(0);
        trace!(store = S::NAME, user_action, delivered, "Published change");
        delivered
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<S: StoreState> Default for Notifier<S> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
