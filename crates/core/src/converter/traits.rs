//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;
use super::types::{EmbeddedMetadata, TranscodeJob, TranscodeResult};

/// Turns a fetched audio stream into the target audio format.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Transcodes `job.input_path` into `job.output_path`.
    async fn transcode(&self, job: TranscodeJob) -> Result<TranscodeResult, ConverterError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}

/// Embeds metadata tags into audio files.
#[async_trait]
pub trait TagWriter: Send + Sync {
    /// Returns the name of this tag writer implementation.
    fn name(&self) -> &str;

    /// Rewrites the file at `path` with `tags` embedded.
    async fn tag_file(&self, path: &Path, tags: &EmbeddedMetadata) -> Result<(), ConverterError>;

    /// Returns a copy of `audio` with `tags` embedded.
    async fn tag_bytes(
        &self,
        audio: Vec<u8>,
        tags: &EmbeddedMetadata,
    ) -> Result<Vec<u8>, ConverterError>;
}
