//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Separator ffmpeg and ID3v2.3 readers understand for multi-valued frames.
const MULTI_VALUE_SEPARATOR: &str = "/";

/// Tags embedded into the output file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedMetadata {
    /// Track title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Artist. Multiple artists may be NUL-separated, as in the manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Release year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl EmbeddedMetadata {
    /// Convert to ffmpeg metadata arguments.
    ///
    /// NUL cannot appear in a process argument, so NUL-separated values are
    /// joined with `/` instead.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(ref title) = self.title {
            args.extend(["-metadata".to_string(), format!("title={}", clean(title))]);
        }
        if let Some(ref artist) = self.artist {
            args.extend(["-metadata".to_string(), format!("artist={}", clean(artist))]);
        }
        if let Some(ref year) = self.year {
            args.extend(["-metadata".to_string(), format!("date={}", clean(year))]);
        }

        args
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.artist.is_none() && self.year.is_none()
    }
}

fn clean(value: &str) -> String {
    value
        .split('\0')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(MULTI_VALUE_SEPARATOR)
}

/// A transcoding job request.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    /// Job ID, usually the task id.
    pub job_id: String,
    /// Downloaded audio stream.
    pub input_path: PathBuf,
    /// Output MP3 path.
    pub output_path: PathBuf,
}

/// Result of a successful transcode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeResult {
    /// Job ID.
    pub job_id: String,
    /// Output file path.
    pub output_path: PathBuf,
    /// Output file size in bytes.
    pub output_size_bytes: u64,
    /// Transcode duration in milliseconds.
    pub duration_ms: u64,
}
