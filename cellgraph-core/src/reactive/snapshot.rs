//! Point-in-time reads of a cell.
//!
//! Reads never block and never hand out anything mutable. Each value is an
//! `Arc` written once per generation, so a consumer holding an old snapshot
//! keeps seeing exactly what it read.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::CellError;
use crate::graph::CellStatus;

/// Type-erased cell value.
pub(crate) type ArcAny = Arc<dyn Any + Send + Sync>;

/// Untyped snapshot returned by [`CellGraph::get`](super::CellGraph::get).
///
/// `value` follows the read rules of the cell's status:
///
/// - `Pending`: the configured placeholder, or `None` when there is none.
/// - `Complete`: the value computed in the current generation.
/// - `Error`: the configured fallback, or `None`. A previous generation's
///   value is never shown for a failed cell.
#[derive(Clone)]
pub struct CellSnapshot {
    /// The cell's name.
    pub name: Arc<str>,
    /// Lifecycle state at the time of the read.
    pub status: CellStatus,
    /// Generation the status belongs to.
    pub generation: u64,
    /// The readable value, see the type-level docs.
    pub value: Option<Arc<dyn Any + Send + Sync>>,
    /// The recorded failure when `status` is `Error`.
    pub error: Option<CellError>,
}

impl CellSnapshot {
    /// Downcast the readable value.
    ///
    /// Returns `None` when there is no value or it is not a `T`.
    pub fn value_as<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.clone()?.downcast::<T>().ok()
    }

    pub fn is_pending(&self) -> bool {
        self.status == CellStatus::Pending
    }

    pub fn is_complete(&self) -> bool {
        self.status == CellStatus::Complete
    }

    pub fn is_error(&self) -> bool {
        self.status == CellStatus::Error
    }
}

impl fmt::Debug for CellSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellSnapshot")
            .field("name", &self.name)
            .field("status", &self.status)
            .field("generation", &self.generation)
            .field("has_value", &self.value.is_some())
            .field("error", &self.error)
            .finish()
    }
}

/// Typed snapshot returned by [`CellGraph::read`](super::CellGraph::read).
pub struct Snapshot<T> {
    /// Lifecycle state at the time of the read.
    pub status: CellStatus,
    /// Generation the status belongs to.
    pub generation: u64,
    /// The readable value (see [`CellSnapshot`] for the rules).
    pub value: Option<Arc<T>>,
    /// The recorded failure when `status` is `Error`.
    pub error: Option<CellError>,
}

impl<T: Send + Sync + 'static> Snapshot<T> {
    pub(crate) fn from_erased(snapshot: CellSnapshot) -> Self {
        let value = snapshot.value_as::<T>();
        Self {
            status: snapshot.status,
            generation: snapshot.generation,
            value,
            error: snapshot.error,
        }
    }
}

impl<T> Snapshot<T> {
    pub fn is_pending(&self) -> bool {
        self.status == CellStatus::Pending
    }

    pub fn is_complete(&self) -> bool {
        self.status == CellStatus::Complete
    }

    pub fn is_error(&self) -> bool {
        self.status == CellStatus::Error
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            generation: self.generation,
            value: self.value.clone(),
            error: self.error.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("status", &self.status)
            .field("generation", &self.generation)
            .field("value", &self.value)
            .field("error", &self.error)
            .finish()
    }
}
