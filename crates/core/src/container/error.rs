//! Error types for the container module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a container.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The container does not exist.
    #[error("Container not found: {path}")]
    NotFound { path: PathBuf },

    /// The requested entry is not in the container.
    #[error("Entry not found in {container}: {entry}")]
    EntryNotFound { container: String, entry: String },

    /// The container or an entry could not be decoded.
    #[error("Malformed container {container}: {reason}")]
    Malformed { container: String, reason: String },

    /// I/O error while reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
