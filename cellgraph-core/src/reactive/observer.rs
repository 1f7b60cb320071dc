//! Observer Implementation
//!
//! An Observer runs a callback whenever one of the cells it watches changes
//! status. It is how presentation code learns that it should re-render.
//!
//! # How Observers Work
//!
//! 1. [`CellGraph::observe`](super::CellGraph::observe) subscribes to the
//!    graph's event channel and spawns a task.
//!
//! 2. The task filters events down to the watched cells and invokes the
//!    callback for each one, in the order the graph published them.
//!
//! 3. Disposing (or dropping) the observer aborts the task.
//!
//! # Differences from reading snapshots
//!
//! - Snapshots are pulled; observers are pushed.
//! - Observers never start evaluations. A cell nobody reads stays pending
//!   and produces no events beyond invalidations.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::warn;

use super::subscriber::{CellEvent, SubscriberId};
use crate::graph::CellId;

/// A callback subscribed to status changes of a set of cells.
///
/// # Example
///
/// ```rust,ignore
/// let observer = graph.observe(&["samples", "groups"], |event| {
///     println!("{} is now {:?}", event.cell, event.status);
/// })?;
///
/// graph.invalidate("samples")?;  // Prints: "samples is now Pending"
/// ```
pub struct Observer {
    /// Unique identifier for this observer.
    id: SubscriberId,

    /// The task delivering events.
    task: JoinHandle<()>,

    /// Whether the observer has been disposed.
    disposed: Arc<AtomicBool>,

    /// Number of times the callback has run.
    run_count: Arc<AtomicUsize>,
}

impl Observer {
    pub(crate) fn spawn<F>(
        runtime: &Handle,
        mut events: broadcast::Receiver<CellEvent>,
        cells: HashSet<CellId>,
        callback: F,
    ) -> Self
    where
        F: Fn(&CellEvent) + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        let disposed = Arc::new(AtomicBool::new(false));
        let run_count = Arc::new(AtomicUsize::new(0));

        let task_disposed = Arc::clone(&disposed);
        let task_run_count = Arc::clone(&run_count);
        let task = runtime.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if task_disposed.load(Ordering::SeqCst) {
                            break;
                        }
                        if cells.contains(&event.id) {
                            callback(&event);
                            task_run_count.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(observer = id.raw(), skipped, "observer fell behind cell events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self {
            id,
            task,
            disposed,
            run_count,
        }
    }

    /// Get the observer's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Stop delivering events.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.task.abort();
    }

    /// Check if the observer has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Get the number of times the callback has run.
    pub fn run_count(&self) -> usize {
        self.run_count.load(Ordering::SeqCst)
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("run_count", &self.run_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
