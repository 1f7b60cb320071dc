//! Error types for the cell graph.
//!
//! Errors fall into two groups:
//!
//! - [`ConfigError`]: the graph was defined or addressed incorrectly
//!   (unknown names, cycles, duplicate definitions). These are returned
//!   directly from `define`, `get`, `invalidate` and friends.
//! - [`CellError`]: a cell failed to produce a value. These are never
//!   returned from graph operations; they are recorded on the cell and
//!   surface through snapshots.

use std::sync::Arc;

use thiserror::Error;

/// A malformed graph definition or a lookup of something that does not exist.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No cell with this name is defined.
    #[error("unknown cell `{0}`")]
    UnknownCell(String),

    /// A dependency list names a cell that has not been defined.
    #[error("cell `{cell}` depends on undefined cell `{dependency}`")]
    UnknownDependency {
        /// The cell being defined.
        cell: String,
        /// The missing dependency.
        dependency: String,
    },

    /// A cell with this name already exists.
    #[error("cell `{0}` is already defined")]
    DuplicateCell(String),

    /// The dependency set would make the graph cyclic.
    #[error("cell `{cell}` would introduce a dependency cycle: {}", path.join(" -> "))]
    Cycle {
        /// The cell being defined.
        cell: String,
        /// Cells on the cycle, starting and ending at the same cell.
        path: Vec<String>,
    },

    /// A cell was looked up with a value type it was not defined with.
    #[error("cell `{cell}` holds `{actual}`, not `{expected}`")]
    TypeMismatch {
        /// The cell that was looked up.
        cell: String,
        /// The requested type.
        expected: &'static str,
        /// The type the cell was defined with.
        actual: &'static str,
    },

    /// An operation needs to spawn a task but no Tokio runtime is available.
    #[error("no tokio runtime available")]
    NoRuntime,

    /// Graph configuration could not be parsed.
    #[error("invalid graph configuration: {0}")]
    InvalidConfig(String),
}

/// Failure returned by a compute function.
///
/// Compute functions wrap whatever their fetch collaborator returns into
/// this type, usually through [`ComputeError::from_error`] or the
/// `From<&str>`/`From<String>` conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ComputeError {
    message: String,
}

impl ComputeError {
    /// Create a compute error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Capture any error's display form.
    pub fn from_error<E: std::error::Error>(err: E) -> Self {
        Self::new(err.to_string())
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for ComputeError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ComputeError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// The failure recorded on a cell in the `error` state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// A dependency is in the error state.
    #[error("cell `{cell}` failed because dependency `{upstream}` failed")]
    Upstream {
        /// The cell that inherited the failure.
        cell: Arc<str>,
        /// The first failed dependency, in declaration order.
        upstream: Arc<str>,
        /// The dependency's own error.
        #[source]
        cause: Box<CellError>,
    },

    /// The cell's own compute step failed.
    #[error("cell `{cell}` failed to compute: {source}")]
    Compute {
        /// The failing cell.
        cell: Arc<str>,
        /// What the compute function reported.
        #[source]
        source: ComputeError,
    },
}

impl CellError {
    /// The cell this error is recorded on.
    pub fn cell(&self) -> &str {
        match self {
            CellError::Upstream { cell, .. } | CellError::Compute { cell, .. } => cell,
        }
    }

    /// Whether the failure came from a dependency rather than this cell.
    pub fn is_upstream(&self) -> bool {
        matches!(self, CellError::Upstream { .. })
    }

    /// Follow upstream links to the compute failure that started the chain.
    pub fn root_cause(&self) -> &CellError {
        let mut current = self;
        while let CellError::Upstream { cause, .. } = current {
            current = cause;
        }
        current
    }
}
