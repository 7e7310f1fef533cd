//! Trait definitions for the remote module.

use async_trait::async_trait;
use std::path::Path;

use super::error::RemoteError;
use super::locator::RemoteLocator;

/// A source of audio streams addressed by [`RemoteLocator`].
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Returns the name of this source implementation.
    fn name(&self) -> &str;

    /// Downloads the audio stream for `locator` into `dest`. Returns the byte count.
    async fn fetch_audio(&self, locator: &RemoteLocator, dest: &Path) -> Result<u64, RemoteError>;
}
