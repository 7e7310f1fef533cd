//! Error types for the checkpoint module.

use std::path::PathBuf;
use thiserror::Error;

use super::hook::TerminationReason;
use super::types::TaskState;

/// Errors that can occur while loading, mutating or flushing a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// No checkpoint exists at the given path.
    #[error("Checkpoint not found: {path}")]
    NotFound { path: PathBuf },

    /// I/O error while reading or writing the checkpoint file.
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The checkpoint file is not valid JSON of the expected shape.
    #[error("Failed to parse checkpoint: {0}")]
    Parse(#[from] serde_json::Error),

    /// A transition was requested from a state the id is not in.
    #[error("Invalid transition for {id}: expected {expected}, found {}", describe(.found))]
    InvalidTransition {
        id: String,
        expected: TaskState,
        found: Option<TaskState>,
    },

    /// Another termination hook is already supervising a run in this process.
    #[error("A termination hook is already active")]
    HookActive,

    /// The supervised run was stopped before it finished.
    #[error("Run stopped by {0:?}")]
    Stopped(TerminationReason),
}

fn describe(found: &Option<TaskState>) -> String {
    match found {
        Some(state) => state.to_string(),
        None => "untracked".to_string(),
    }
}

impl CheckpointError {
    /// Whether this error means there is simply no prior run.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
