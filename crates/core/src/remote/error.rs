//! Error types for the remote module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching from a remote source.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The downloader binary is missing.
    #[error("Downloader not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The task's remote id cannot be turned into a locator.
    #[error("Invalid remote locator: {0}")]
    InvalidLocator(String),

    /// The download itself failed.
    #[error("Download of {url} failed: {reason}")]
    DownloadFailed {
        url: String,
        reason: String,
        stderr: Option<String>,
    },

    /// I/O error while staging the download.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    pub fn download_failed(url: impl Into<String>, reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            reason: reason.into(),
            stderr,
        }
    }
}
