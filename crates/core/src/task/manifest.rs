//! Manifest entries as published by the BGM database, and how to fetch them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while loading the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Manifest request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Manifest file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("I/O error reading manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A single asset descriptor from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    #[serde(default)]
    pub description: String,
    pub filename: String,
    #[serde(default)]
    pub mark: String,
    pub metadata: EntryMetadata,
    pub source: EntrySource,
    /// Remote video id. Empty when the entry has no remote source.
    #[serde(default)]
    pub youtube: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Container group the asset lives in, e.g. `Bgm00`.
    pub structure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Fetches the manifest over HTTP.
pub async fn fetch_manifest(url: &str, timeout: Duration) -> Result<Vec<ManifestEntry>, ManifestError> {
    info!("Fetching manifest from {}", url);
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let entries: Vec<ManifestEntry> = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    debug!("Manifest contains {} entries", entries.len());
    Ok(entries)
}

/// Loads the manifest from a local JSON file.
pub async fn load_manifest_file(path: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ManifestError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let entries: Vec<ManifestEntry> = serde_json::from_slice(&raw)?;
    info!("Loaded {} manifest entries from {:?}", entries.len(), path);
    Ok(entries)
}
