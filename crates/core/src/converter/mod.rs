//! Converter module for transcoding fetched audio and embedding tags.
//!
//! Two capabilities live here, both backed by FFmpeg:
//!
//! - [`Transcoder`]: turns a downloaded audio stream into the target MP3 file.
//! - [`TagWriter`]: embeds artist / title / year into an MP3, either in place
//!   on disk or on an in-memory buffer (used for locally extracted payloads,
//!   which have no file yet).
//!
//! # Example
//!
//! ```ignore
//! use bgmbuild_core::converter::{FfmpegConverter, Transcoder, TagWriter, TranscodeJob};
//!
//! let converter = FfmpegConverter::with_defaults();
//! converter.validate().await?;
//!
//! let job = TranscodeJob {
//!     job_id: "Bgm00/FloralLife".to_string(),
//!     input_path: PathBuf::from("/tmp/FloralLife.webm"),
//!     output_path: PathBuf::from("/tmp/FloralLife.mp3"),
//! };
//! converter.transcode(job).await?;
//! converter.tag_file(Path::new("/tmp/FloralLife.mp3"), &tags).await?;
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::{TagWriter, Transcoder};
pub use types::{EmbeddedMetadata, TranscodeJob, TranscodeResult};
