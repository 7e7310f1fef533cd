//! Error types for the resolver module.

use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::container::ContainerError;
use crate::converter::ConverterError;
use crate::remote::RemoteError;

/// Errors that can occur while resolving a single task.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The id is not in the task index.
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Converter(#[from] ConverterError),

    /// The whole acquisition exceeded the configured timeout.
    #[error("Acquisition timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    /// Which stage failed, for reporting.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnknownTask(_) | Self::Checkpoint(_) => "state",
            Self::Container(_) => "extract",
            Self::Remote(_) => "download",
            Self::Converter(_) => "convert",
            Self::Timeout { .. } => "timeout",
            Self::Io(_) => "io",
        }
    }
}
