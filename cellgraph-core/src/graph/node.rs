//! Graph Nodes
//!
//! This module defines the node type that lives in the dependency graph and
//! the lifecycle state machine each cell goes through.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Unique identifier for a cell in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
    /// Generate a new unique cell ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for CellId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    /// The cell has no result for its current generation yet.
    Pending,

    /// The cell holds a value computed in its current generation.
    Complete,

    /// The cell's current generation failed.
    Error,
}

impl CellStatus {
    /// `Complete` and `Error` are terminal for a generation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CellStatus::Pending)
    }
}

/// Dependency list of a node. Most cells await a handful of others.
pub type Dependencies = SmallVec<[CellId; 4]>;

/// A node in the dependency graph.
#[derive(Debug)]
pub struct Node {
    /// Unique identifier for this node.
    id: CellId,

    /// Name the cell was defined under.
    name: Arc<str>,

    /// Current lifecycle state.
    status: CellStatus,

    /// Incremented on every invalidation.
    generation: u64,

    /// Generation of the evaluation currently running, if any.
    in_flight: Option<u64>,

    /// Set the first time anything reads or awaits the cell.
    /// Only observed cells are recomputed eagerly after invalidation.
    observed: bool,

    /// Nodes that this node reads from, in declaration order.
    dependencies: Dependencies,

    /// Nodes that read from this node, in the order they were defined.
    dependents: IndexSet<CellId>,
}

impl Node {
    /// Create a pending node at generation 1.
    pub fn new(name: impl Into<Arc<str>>, dependencies: Dependencies) -> Self {
        Self {
            id: CellId::new(),
            name: name.into(),
            status: CellStatus::Pending,
            generation: 1,
            in_flight: None,
            observed: false,
            dependencies,
            dependents: IndexSet::new(),
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Get the node's name.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Get the current status.
    pub fn status(&self) -> CellStatus {
        self.status
    }

    /// Get the current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether anything has read this cell yet.
    pub fn is_observed(&self) -> bool {
        self.observed
    }

    /// Record that a consumer read or awaited the cell.
    pub fn mark_observed(&mut self) {
        self.observed = true;
    }

    /// Whether the cell is pending with nothing running for its generation.
    pub fn needs_evaluation(&self) -> bool {
        self.status == CellStatus::Pending && self.in_flight != Some(self.generation)
    }

    /// Claim the current generation for a new evaluation.
    ///
    /// Returns the generation the evaluation must present when it settles.
    pub fn begin_evaluation(&mut self) -> u64 {
        self.in_flight = Some(self.generation);
        self.generation
    }

    /// Whether an evaluation started at `generation` may still write.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Supersede the current generation and return to pending.
    pub fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        self.status = CellStatus::Pending;
        self.in_flight = None;
        self.generation
    }

    /// Record the outcome of the current generation.
    pub fn settle(&mut self, status: CellStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.in_flight = None;
    }

    /// Get all dependencies, in declaration order.
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    #[cfg(test)]
    pub(crate) fn add_dependency(&mut self, node_id: CellId) {
        self.dependencies.push(node_id);
    }

    /// Add a dependent (a node that reads from this node).
    pub fn add_dependent(&mut self, node_id: CellId) {
        self.dependents.insert(node_id);
    }

    /// Remove a dependent.
    pub fn remove_dependent(&mut self, node_id: CellId) {
        self.dependents.shift_remove(&node_id);
    }

    /// Get all dependents, in the order they were added.
    pub fn dependents(&self) -> &IndexSet<CellId> {
        &self.dependents
    }
}
