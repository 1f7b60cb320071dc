//! Input Cells
//!
//! An input is a source cell whose value is owned by the store rather than
//! fetched: a URL parameter, a selected session id, a user toggle. It has no
//! dependencies and its compute step just hands back the value currently
//! held.
//!
//! # How Inputs Work
//!
//! 1. [`CellGraph::input`](super::CellGraph::input) defines the cell and
//!    returns an [`Input`] holding the initial value.
//!
//! 2. [`CellGraph::set_input`](super::CellGraph::set_input) replaces the held
//!    value and invalidates the cell, which cascades to every dependent.
//!
//! 3. Dependents read the new value through their `Inputs` like any other
//!    dependency.

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;

use super::cell::Cell;

/// A source cell holding a value of type `T`.
///
/// Clones share the held value.
///
/// # Example
///
/// ```rust,ignore
/// let session_id = graph.input("session_id", "abc123".to_string())?;
///
/// // Dependents see the new id after the cascade settles.
/// graph.set_input(&session_id, "def456".to_string());
/// ```
pub struct Input<T> {
    cell: Cell<T>,
    current: Arc<RwLock<Arc<T>>>,
}

impl<T> Input<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(cell: Cell<T>, current: Arc<RwLock<Arc<T>>>) -> Self {
        Self { cell, current }
    }

    /// The cell handle, for dependency lists and typed reads.
    pub fn cell(&self) -> &Cell<T> {
        &self.cell
    }

    /// Get the name the input was defined under.
    pub fn name(&self) -> &str {
        self.cell.name()
    }

    /// The value currently held, without going through the graph.
    ///
    /// This may be newer than what dependents have computed with, while an
    /// invalidation is still cascading.
    pub fn current(&self) -> Arc<T> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a new value. The graph invalidates the cell afterwards.
    pub(crate) fn replace(&self, value: T) {
        *self.current.write() = Arc::new(value);
    }
}

impl<T> Clone for Input<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            current: Arc::clone(&self.current),
        }
    }
}

impl<T: Debug> Debug for Input<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("name", &self.cell.name())
            .field("value", &*self.current.read())
            .finish()
    }
}
