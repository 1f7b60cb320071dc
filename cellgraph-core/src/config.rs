//! Graph configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for a [`CellGraph`](crate::reactive::CellGraph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Label used in logs and reports, usually the owning store's name.
    pub name: String,

    /// Capacity of the change-event broadcast channel. Subscribers that fall
    /// further behind than this skip ahead and log a warning.
    pub event_capacity: usize,

    /// Recompute observed cells right after invalidation. When disabled,
    /// invalidated cells stay pending until they are next read.
    pub eager_refresh: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            name: "cells".to_string(),
            event_capacity: 256,
            eager_refresh: true,
        }
    }
}

impl GraphConfig {
    /// Create the default configuration with a custom name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        if config.event_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}
