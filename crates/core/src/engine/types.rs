//! Types for the engine module.

use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// A task whose acquisition failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub id: TaskId,
    /// Failing stage, e.g. `download` or `convert`.
    pub stage: String,
    pub error: String,
}

/// Result of draining one queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineReport {
    /// Ids that reached done, in completion order.
    pub completed: Vec<TaskId>,
    pub failed: Vec<TaskFailure>,
}

impl EngineReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

