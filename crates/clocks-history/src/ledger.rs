//! Undo/redo ledger of snapshots.
//!
//! The ledger is an append-only list of entries plus a cursor:
//! - `cursor == None` means the live state at the tip is being viewed
//! - `cursor == Some(i)` means the user scrubbed back to `entries[i]`
//!
//! Pushing while the cursor is set discards everything after the cursor
//! first, the same way a new edit after undo forks a new timeline branch.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::debug;

/// Default maximum number of ledger entries.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// A single entry in the ledger.
#[derive(Debug, Clone)]
pub struct LedgerEntry<T> {
    /// The state at this point in history.
    pub snapshot: T,
    /// Human-readable description of the change that produced it.
    pub label: String,
    /// When this entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Where the ledger is positioned, for "N / total" displays and sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayIndex {
    /// `count` at the tip, otherwise the cursor.
    pub position: usize,
    /// Number of entries.
    pub count: usize,
}

impl DisplayIndex {
    /// Whether the live state is being viewed.
    pub fn is_tip(&self) -> bool {
        self.position == self.count
    }

    /// Fractional slider position in `[0, 1]`.
    pub fn slider_value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.position as f64 / self.count as f64
        }
    }
}

impl fmt::Display for DisplayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.position, self.count)
    }
}

/// Bounded undo/redo history with a cursor.
#[derive(Debug, Clone)]
pub struct HistoryLedger<T> {
    entries: Vec<LedgerEntry<T>>,
    cursor: Option<usize>,
    max_entries: usize,
}

impl<T> HistoryLedger<T> {
    /// Create an empty ledger holding at most `max_entries` entries (at least one).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            max_entries: max_entries.max(1),
        }
    }

    /// Append a snapshot at the tip.
    ///
    /// - Discards entries after the cursor if one is set.
    /// - Resets the cursor to the tip.
    /// - Evicts the oldest entries beyond `max_entries`.
    pub fn push(&mut self, label: impl Into<String>, snapshot: T) {
        let label = label.into();

        if let Some(cursor) = self.cursor.take() {
            let discarded = self.entries.len().saturating_sub(cursor + 1);
            self.entries.truncate(cursor + 1);
            if discarded > 0 {
                debug!(discarded, cursor, "Discarded redo entries");
            }
        }

        self.entries.push(LedgerEntry {
            snapshot,
            label,
            recorded_at: Utc::now(),
        });

        self.evict();

        debug!(
            label = %self.entries[self.entries.len() - 1].label,
            depth = self.entries.len(),
            "Ledger entry pushed"
        );
    }

    /// View a historical entry.
    ///
    /// Out-of-range indices return `None` and leave the cursor unchanged.
    pub fn seek(&mut self, index: usize) -> Option<&T> {
        if index >= self.entries.len() {
            debug!(index, len = self.entries.len(), "Seek out of range ignored");
            return None;
        }

        self.cursor = Some(index);
        debug!(index, "Seek");
        Some(&self.entries[index].snapshot)
    }

    /// Go back to viewing the live state, returning the tip entry.
    pub fn return_to_tip(&mut self) -> Option<&T> {
        let tip = self.entries.last()?;
        self.cursor = None;
        debug!(len = self.entries.len(), "Returned to tip");
        Some(&tip.snapshot)
    }

    /// Step one entry back from the current view.
    pub fn undo(&mut self) -> Option<&T> {
        let target = match self.cursor {
            None => self.entries.len().checked_sub(2)?,
            Some(0) => return None,
            Some(cursor) => cursor - 1,
        };
        self.seek(target)
    }

    /// Step one entry forward; stepping onto the last entry returns to the tip.
    pub fn redo(&mut self) -> Option<&T> {
        let cursor = self.cursor?;
        if cursor + 2 >= self.entries.len() {
            self.return_to_tip()
        } else {
            self.seek(cursor + 1)
        }
    }

    /// Whether `undo` would move.
    pub fn can_undo(&self) -> bool {
        match self.cursor {
            None => self.entries.len() >= 2,
            Some(cursor) => cursor > 0,
        }
    }

    /// Whether `redo` would move.
    pub fn can_redo(&self) -> bool {
        self.cursor.is_some()
    }

    /// Current position and entry count.
    pub fn current_display_index(&self) -> DisplayIndex {
        let count = self.entries.len();
        DisplayIndex {
            position: self.cursor.unwrap_or(count),
            count,
        }
    }

    /// The cursor, `None` at the tip.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Whether the live state is being viewed.
    pub fn is_at_tip(&self) -> bool {
        self.cursor.is_none()
    }

    /// The most recent entry.
    pub fn tip(&self) -> Option<&T> {
        self.entries.last().map(|e| &e.snapshot)
    }

    /// The entry at `index`, without moving the cursor.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index).map(|e| &e.snapshot)
    }

    /// The label of the entry at `index`.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.label.as_str())
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[LedgerEntry<T>] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Change the bound, evicting the oldest entries if needed.
    ///
    /// Returns `true` when the entry being viewed was evicted. The cursor then
    /// rests on the oldest surviving entry, which the owner should restore.
    #[must_use]
    pub fn set_max_entries(&mut self, max: usize) -> bool {
        self.max_entries = max.max(1);
        self.evict()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        debug!("Ledger cleared");
    }

    fn evict(&mut self) -> bool {
        let excess = self.entries.len().saturating_sub(self.max_entries);
        if excess == 0 {
            return false;
        }

        self.entries.drain(..excess);
        let viewed_evicted = matches!(self.cursor, Some(c) if c < excess);
        self.cursor = self.cursor.map(|c| c.saturating_sub(excess));
        if viewed_evicted {
            debug!(evicted = excess, "Evicted the viewed entry, cursor moved to oldest");
        } else {
            debug!(evicted = excess, "Evicted oldest ledger entries");
        }
        viewed_evicted
    }
}

impl<T> Default for HistoryLedger<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
