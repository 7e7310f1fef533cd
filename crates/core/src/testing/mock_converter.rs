//! Mock transcoder and tag writer for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::converter::{
    ConverterError, EmbeddedMetadata, TagWriter, TranscodeJob, TranscodeResult, Transcoder,
};

const TAG_MAGIC: &[u8] = b"MOCKTAG\n";

/// Mock [`Transcoder`] that copies input to output unchanged.
#[derive(Debug, Clone, Default)]
pub struct MockTranscoder {
    jobs: Arc<RwLock<Vec<TranscodeJob>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn jobs(&self) -> Vec<TranscodeJob> {
        self.jobs.read().await.clone()
    }

    /// Makes transcodes of the given job id fail.
    pub async fn fail_on(&self, job_id: &str) {
        self.failing.write().await.insert(job_id.to_string());
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(&self, job: TranscodeJob) -> Result<TranscodeResult, ConverterError> {
        self.jobs.write().await.push(job.clone());

        if self.failing.read().await.contains(&job.job_id) {
            return Err(ConverterError::conversion_failed("mock failure", None));
        }
        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = tokio::fs::copy(&job.input_path, &job.output_path).await?;

        Ok(TranscodeResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: size,
            duration_ms: 0,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}

/// Mock [`TagWriter`].
///
/// Prepends a small JSON header carrying the tags, so tests can read back
/// what was written with [`MockTagWriter::read_tags`] and the original audio
/// with [`MockTagWriter::strip_tags`].
#[derive(Debug, Clone, Default)]
pub struct MockTagWriter {
    tagged: Arc<RwLock<Vec<EmbeddedMetadata>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl MockTagWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags written so far, in call order.
    pub async fn tagged(&self) -> Vec<EmbeddedMetadata> {
        self.tagged.read().await.clone()
    }

    /// Makes tag calls for the given title fail.
    pub async fn fail_on_title(&self, title: &str) {
        self.failing.write().await.insert(title.to_string());
    }

    fn encode(audio: &[u8], tags: &EmbeddedMetadata) -> Result<Vec<u8>, ConverterError> {
        let header = serde_json::to_vec(tags)
            .map_err(|e| ConverterError::conversion_failed(e.to_string(), None))?;
        let mut out = Vec::with_capacity(TAG_MAGIC.len() + header.len() + 1 + audio.len());
        out.extend_from_slice(TAG_MAGIC);
        out.extend_from_slice(&header);
        out.push(b'\n');
        out.extend_from_slice(Self::strip_tags(audio));
        Ok(out)
    }

    fn split(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
        let rest = bytes.strip_prefix(TAG_MAGIC)?;
        let end = rest.iter().position(|b| *b == b'\n')?;
        Some((&rest[..end], &rest[end + 1..]))
    }

    /// Tags embedded by this writer, if any.
    pub fn read_tags(bytes: &[u8]) -> Option<EmbeddedMetadata> {
        let (header, _) = Self::split(bytes)?;
        serde_json::from_slice(header).ok()
    }

    /// Audio with any tag header removed.
    pub fn strip_tags(bytes: &[u8]) -> &[u8] {
        Self::split(bytes).map(|(_, audio)| audio).unwrap_or(bytes)
    }

    async fn record(&self, tags: &EmbeddedMetadata) -> Result<(), ConverterError> {
        self.tagged.write().await.push(tags.clone());
        let failing = self.failing.read().await;
        if tags.title.as_ref().is_some_and(|t| failing.contains(t)) {
            return Err(ConverterError::conversion_failed("mock failure", None));
        }
        Ok(())
    }
}

#[async_trait]
impl TagWriter for MockTagWriter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn tag_file(&self, path: &Path, tags: &EmbeddedMetadata) -> Result<(), ConverterError> {
        self.record(tags).await?;
        let audio = tokio::fs::read(path).await.map_err(|_| ConverterError::InputNotFound {
            path: path.to_path_buf(),
        })?;
        tokio::fs::write(path, Self::encode(&audio, tags)?).await?;
        Ok(())
    }

    async fn tag_bytes(
        &self,
        audio: Vec<u8>,
        tags: &EmbeddedMetadata,
    ) -> Result<Vec<u8>, ConverterError> {
        self.record(tags).await?;
        Self::encode(&audio, tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> EmbeddedMetadata {
        EmbeddedMetadata {
            title: Some("Floral Life".to_string()),
            artist: Some("Wizet".to_string()),
            year: None,
        }
    }

    #[tokio::test]
    async fn test_tag_bytes_round_trips_tags() {
        let writer = MockTagWriter::new();
        let tagged = writer.tag_bytes(b"audio".to_vec(), &tags()).await.unwrap();

        assert_eq!(MockTagWriter::read_tags(&tagged), Some(tags()));
        assert_eq!(MockTagWriter::strip_tags(&tagged), b"audio");
        assert_eq!(writer.tagged().await.len(), 1);
    }

    #[tokio::test]
    async fn test_retagging_replaces_header() {
        let writer = MockTagWriter::new();
        let once = writer.tag_bytes(b"audio".to_vec(), &tags()).await.unwrap();
        let twice = writer
            .tag_bytes(once, &EmbeddedMetadata::default())
            .await
            .unwrap();
        assert_eq!(MockTagWriter::strip_tags(&twice), b"audio");
        assert_eq!(MockTagWriter::read_tags(&twice), Some(EmbeddedMetadata::default()));
    }

    #[tokio::test]
    async fn test_transcoder_copies() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.src");
        std::fs::write(&input, b"raw").unwrap();

        let transcoder = MockTranscoder::new();
        let result = transcoder
            .transcode(TranscodeJob {
                job_id: "x".to_string(),
                input_path: input,
                output_path: dir.path().join("out").join("a.mp3"),
            })
            .await
            .unwrap();

        assert_eq!(result.output_size_bytes, 3);
        assert_eq!(std::fs::read(result.output_path).unwrap(), b"raw");
    }

    #[tokio::test]
    async fn test_failures_are_per_job_and_title() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.src");
        std::fs::write(&input, b"raw").unwrap();
        let transcoder = MockTranscoder::new();
        transcoder.fail_on("bad").await;

        let job = |id: &str| TranscodeJob {
            job_id: id.to_string(),
            input_path: input.clone(),
            output_path: dir.path().join(format!("{}.mp3", id)),
        };
        assert!(transcoder.transcode(job("bad")).await.is_err());
        assert!(transcoder.transcode(job("good")).await.is_ok());
        assert_eq!(transcoder.jobs().await.len(), 2);

        let writer = MockTagWriter::new();
        writer.fail_on_title("Floral Life").await;
        assert!(writer.tag_bytes(b"a".to_vec(), &tags()).await.is_err());
        assert!(writer
            .tag_bytes(b"a".to_vec(), &EmbeddedMetadata::default())
            .await
            .is_ok());
    }
}
