//! Dependency Graph
//!
//! This module implements the dependency graph that tracks relationships
//! between cells and the lifecycle of each one.
//!
//! # Overview
//!
//! The dependency graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes represent cells (inputs or derived values)
//! - Edges represent dependencies: if A depends on B, there is an edge from B to A
//!
//! When a cell is invalidated, we traverse the graph to find all affected
//! nodes, bump their generations and mark them pending. The runtime then
//! restarts the ones that are being observed.
//!
//! # Design Decisions
//!
//! 1. Dependencies are declared explicitly when a cell is defined. There is
//!    no implicit tracking, so the full graph is known up front and cycles
//!    are rejected at definition time.
//!
//! 2. The graph is indexed by cell ID and keeps definition order, which is
//!    also the order dependents are notified in.
//!
//! 3. We maintain both forward (dependencies) and reverse (dependents) edges
//!    to enable efficient traversal in both directions.

mod node;
mod scheduler;

pub use node::{CellId, CellStatus, Dependencies, Node};
pub use scheduler::UpdateScheduler;
