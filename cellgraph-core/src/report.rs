//! Serializable status reports.
//!
//! A [`GraphReport`] is a plain-data dump of every cell's state, meant for
//! debug panels and logs. It can be shipped as JSON or MessagePack.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::CellStatus;

/// Failure encoding or decoding a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("msgpack encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("msgpack decoding failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// State of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellReport {
    pub name: String,
    pub status: CellStatus,
    pub generation: u64,
    /// Dependency names, in declaration order.
    pub dependencies: Vec<String>,
    /// Rust type name of the cell's value.
    pub value_type: String,
    /// Whether a successful value has ever been recorded.
    pub has_value: bool,
    /// Error message of the current generation, if it failed.
    pub error: Option<String>,
}

/// State of a whole graph, cells in definition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphReport {
    pub graph: String,
    pub cells: Vec<CellReport>,
}

impl GraphReport {
    /// Number of cells in `status`.
    pub fn count(&self, status: CellStatus) -> usize {
        self.cells.iter().filter(|c| c.status == status).count()
    }

    /// Look up a cell by name.
    pub fn cell(&self, name: &str) -> Option<&CellReport> {
        self.cells.iter().find(|c| c.name == name)
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, ReportError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, ReportError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
