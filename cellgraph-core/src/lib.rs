//! cellgraph Core
//!
//! This crate provides dependency-tracked asynchronous derived values for
//! client-side stores. It implements:
//!
//! - A graph of named cells, each computed from other cells plus an
//!   external asynchronous fetch
//! - Generation-based invalidation that drops superseded results
//! - Non-blocking snapshot reads with `pending` / `complete` / `error` status
//! - Change events for presentation code
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Dependency topology and the per-cell lifecycle
//! - `reactive`: The engine, typed handles, inputs and observers
//! - `config`: Graph configuration
//! - `report`: Serializable status reports
//!
//! # Example
//!
//! ```rust,ignore
//! use cellgraph_core::{CellGraph, CellOptions, GraphConfig};
//!
//! let graph = CellGraph::new(GraphConfig::named("comparison"));
//!
//! // A source cell owned by the store
//! let session_id = graph.input("session_id", "abc123".to_string())?;
//!
//! // A derived cell backed by a fetch
//! let session = graph.define(
//!     "session",
//!     &["session_id"],
//!     move |inputs| {
//!         let id = inputs.get(session_id.cell());
//!         async move { client.get_session(&id?).await.map_err(ComputeError::from_error) }
//!     },
//!     CellOptions::new(),
//! )?;
//!
//! // Never blocks; pending until the fetch resolves
//! let snapshot = graph.read(&session)?;
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;
pub mod report;

pub use config::GraphConfig;
pub use error::{CellError, ComputeError, ConfigError};
pub use graph::{CellId, CellStatus};
pub use reactive::{
    Cell, CellEvent, CellGraph, CellOptions, CellSnapshot, Inputs, Input, Observer, Snapshot,
};
pub use report::{CellReport, GraphReport, ReportError};
