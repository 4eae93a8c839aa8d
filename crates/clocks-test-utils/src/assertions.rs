//! Assertion helpers for change notifications.
//!
//! All helpers read with `try_recv`, so they only see notifications that were
//! already published when called.

use clocks_core::{ChangeNotification, StoreState};
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

/// Take every pending notification.
pub fn drain<S: StoreState>(rx: &mut Receiver<ChangeNotification<S>>) -> Vec<ChangeNotification<S>> {
    let mut received = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(notification) => received.push(notification),
            Err(TryRecvError::Lagged(n)) => panic!("Receiver lagged by {n} notifications"),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return received,
        }
    }
}

/// Assert that exactly one notification is pending and it is a user action.
///
/// Returns its change.
pub fn expect_user_action<S: StoreState>(rx: &mut Receiver<ChangeNotification<S>>) -> S::Change {
    let mut received = drain(rx);
    assert_eq!(
        received.len(),
        1,
        "Expected one {} notification, got {:?}",
        S::NAME,
        received
    );
    let notification = received.remove(0);
    match notification.origin.change() {
        Some(change) => change.clone(),
        None => panic!(
            "Expected a user action on {}, got {:?}",
            S::NAME,
            notification.origin
        ),
    }
}

/// Assert that exactly one notification is pending and it is a replay.
pub fn expect_replay<S: StoreState>(rx: &mut Receiver<ChangeNotification<S>>) -> ChangeNotification<S> {
    let mut received = drain(rx);
    assert_eq!(
        received.len(),
        1,
        "Expected one {} notification, got {:?}",
        S::NAME,
        received
    );
    let notification = received.remove(0);
    assert!(
        notification.origin.is_replay(),
        "Expected a replay on {}, got {:?}",
        S::NAME,
        notification.origin
    );
    notification
}

/// Assert that nothing is pending.
pub fn expect_silent<S: StoreState>(rx: &mut Receiver<ChangeNotification<S>>) {
    let received = drain(rx);
    assert!(
        received.is_empty(),
        "Expected no {} notifications, got {:?}",
        S::NAME,
        received
    );
}
