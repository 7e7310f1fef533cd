//! Configuration for the execution engine.

use serde::{Deserialize, Serialize};

/// Execution engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum simultaneously outstanding remote acquisitions.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Upper bound for one acquisition in seconds. Unset waits forever.
    #[serde(default)]
    pub download_timeout_secs: Option<u64>,
}

fn default_concurrency() -> usize {
    20
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            download_timeout_secs: None,
        }
    }
}

impl EngineConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}
