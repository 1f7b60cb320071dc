//! Asynchronous Cells
//!
//! This module implements the cell graph engine: derived cells, input cells,
//! snapshots and change notification.
//!
//! # Concepts
//!
//! ## Cells
//!
//! A cell is a named value computed by an asynchronous function from the
//! values of the cells it declares as dependencies. A cell is `Pending`
//! until its current generation has a result, then `Complete` or `Error`.
//!
//! ## Inputs
//!
//! An input is a cell whose value is set by its owner instead of computed.
//! Setting it invalidates every cell that depends on it.
//!
//! ## Generations
//!
//! Every invalidation starts a new generation. Results computed for an older
//! generation are discarded when they arrive, so consumers only ever see the
//! latest one.
//!
//! ## Observers
//!
//! An observer runs a callback whenever a watched cell changes status. This
//! is the hook presentation code uses to re-render.
//!
//! # Implementation Notes
//!
//! Dependencies are explicit: a cell lists the names it reads when it is
//! defined. The graph knows its full shape up front, which lets it reject
//! cycles at definition time and lets evaluation wait on exactly the right
//! cells.

mod cell;
mod input;
mod observer;
mod options;
mod runtime;
mod snapshot;
mod subscriber;

pub use cell::{Cell, Inputs};
pub use input::Input;
pub use observer::Observer;
pub use options::CellOptions;
pub use runtime::CellGraph;
pub use snapshot::{CellSnapshot, Snapshot};
pub use subscriber::{CellEvent, SubscriberId};
