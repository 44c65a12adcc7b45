//! Dispatch limits configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Optional safety limits applied to every pipeline run.
///
/// Both limits are off by default. A loop pipeline whose middlewares never
/// stop answering will then run forever.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum number of passes a loop pipeline may start. The first pass
    /// always runs.
    pub max_loop_passes: Option<u32>,
    /// Wall-clock budget for a single run, in milliseconds.
    pub deadline_ms: Option<u64>,
}

impl DispatchConfig {
    /// Returns the run deadline as a [`Duration`].
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}
