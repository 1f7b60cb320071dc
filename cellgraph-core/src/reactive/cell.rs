//! Typed cell handles and compute inputs.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use smallvec::SmallVec;

use super::snapshot::ArcAny;
use crate::error::ComputeError;
use crate::graph::CellId;

/// Typed handle to a cell.
///
/// A handle is only a key: it does not keep the graph alive and it does not
/// hold the value. Read it through the graph that defined it, or through
/// [`Inputs`] inside a compute function.
pub struct Cell<T> {
    id: CellId,
    name: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Cell<T> {
    pub(crate) fn new(id: CellId, name: Arc<str>) -> Self {
        Self {
            id,
            name,
            _marker: PhantomData,
        }
    }

    /// Get the cell's graph ID.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Get the name the cell was defined under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Cell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Cell<T> {}

impl<T> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("id", &self.id.raw())
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

/// Resolved dependency values handed to a compute function.
///
/// All values belong to the same evaluation: they were captured together
/// once every dependency had completed.
pub struct Inputs {
    cell: Arc<str>,
    values: SmallVec<[(Arc<str>, ArcAny); 4]>,
}

impl Inputs {
    pub(crate) fn new(cell: Arc<str>, values: SmallVec<[(Arc<str>, ArcAny); 4]>) -> Self {
        Self { cell, values }
    }

    /// The cell being computed.
    pub fn cell(&self) -> &str {
        &self.cell
    }

    /// Value of a dependency, by handle.
    pub fn get<T: Send + Sync + 'static>(&self, cell: &Cell<T>) -> Result<Arc<T>, ComputeError> {
        self.by_name(cell.name())
    }

    /// Value of a dependency, by name.
    pub fn by_name<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ComputeError> {
        let value = self
            .values
            .iter()
            .find(|(dep, _)| &**dep == name)
            .map(|(_, value)| Arc::clone(value))
            .ok_or_else(|| {
                ComputeError::new(format!(
                    "`{name}` is not a dependency of `{}`",
                    self.cell
                ))
            })?;

        value.downcast::<T>().map_err(|_| {
            ComputeError::new(format!(
                "dependency `{name}` of `{}` is not a `{}`",
                self.cell,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Dependency names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| &**name)
    }

    /// Number of dependencies.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the cell has no dependencies.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Inputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inputs")
            .field("cell", &self.cell)
            .field("dependencies", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
