use crate::error::{AggregatorError, AggregatorResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Depth buckets reserved up front; deeper trees grow the index on demand.
pub const DEFAULT_DEPTH_CAPACITY: usize = 10;

/// Tunables for a [`ChangeAggregator`](crate::ChangeAggregator).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregatorSettings {
    /// Initial number of depth buckets in the depth index.
    pub depth_capacity: usize,
    /// Verify the structural invariants after every recorded edit.
    ///
    /// Costs a full pass over the tracked anchors per edit; meant for tests and
    /// debugging hosts.
    pub check_invariants: bool,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            depth_capacity: DEFAULT_DEPTH_CAPACITY,
            check_invariants: false,
        }
    }
}

impl AggregatorSettings {
    pub fn from_toml_str(contents: &str) -> AggregatorResult<Self> {
        toml::from_str(contents).map_err(|err| AggregatorError::config(err.to_string()))
    }

    pub fn load(path: &Path) -> AggregatorResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|err| AggregatorError::config(format!("{}: {}", path.display(), err)))
    }
}
