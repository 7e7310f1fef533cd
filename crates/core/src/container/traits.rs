//! Trait definitions for the container module.

use async_trait::async_trait;

use super::error::ContainerError;
use super::types::{Extraction, SoundNode};

/// A read-only archive of sound-bearing entries.
#[async_trait]
pub trait AssetContainer: Send + Sync {
    /// Returns the container's name, for logging.
    fn name(&self) -> &str;

    /// Lists top-level entry names.
    async fn entries(&self) -> Result<Vec<String>, ContainerError>;

    /// Lists the sound nodes directly under `entry`.
    async fn sound_nodes(&self, entry: &str) -> Result<Vec<SoundNode>, ContainerError>;

    /// Extracts a node's raw audio payload.
    async fn extract(&self, node: &SoundNode) -> Result<Extraction, ContainerError>;
}
