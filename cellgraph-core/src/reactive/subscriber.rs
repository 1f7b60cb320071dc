//! Subscriber types for the cell graph.
//!
//! Every status transition of a cell is published as a [`CellEvent`].
//! Presentation code subscribes to these to know when to re-render.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::graph::{CellId, CellStatus};

/// Unique identifier for a subscriber.
///
/// Each observer gets a unique ID when created; it shows up in logs so a
/// lagging observer can be told apart from the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A status transition of one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEvent {
    /// The cell that changed.
    pub id: CellId,
    /// Its name.
    pub cell: Arc<str>,
    /// The status it moved to.
    pub status: CellStatus,
    /// The generation the new status belongs to.
    pub generation: u64,
}

impl CellEvent {
    /// Whether the cell now has a result to render (value or error).
    pub fn is_settled(&self) -> bool {
        self.status.is_terminal()
    }
}
