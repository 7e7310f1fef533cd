//! FFmpeg-based transcoder and tag writer.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::{TagWriter, Transcoder};
use super::types::{EmbeddedMetadata, TranscodeJob, TranscodeResult};

/// MP3 encoder used for every output.
const MP3_CODEC: &str = "libmp3lame";

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Builds ffmpeg arguments for transcoding to MP3.
    fn build_transcode_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-vn".to_string(), // Drop any video or cover stream from the source
            "-c:a".to_string(),
            MP3_CODEC.to_string(),
        ];

        if let Some(bitrate) = self.config.bitrate_kbps {
            args.extend(["-b:a".to_string(), format!("{}k", bitrate)]);
        }

        args.extend(self.common_args());
        args.extend(["-f".to_string(), "mp3".to_string()]);
        args.push(output_path.to_string_lossy().to_string());

        args
    }

    /// Builds ffmpeg arguments for remuxing with tags. No re-encoding happens.
    fn build_tag_args(&self, input: &str, output: &str, tags: &EmbeddedMetadata) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string(),
            "-map".to_string(),
            "0:a".to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-id3v2_version".to_string(),
            "3".to_string(),
        ];

        args.extend(tags.to_ffmpeg_args());
        args.extend(self.common_args());
        args.extend(["-f".to_string(), "mp3".to_string()]);
        args.push(output.to_string());

        args
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ];
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.ffmpeg_path);
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> ConverterError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConverterError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            ConverterError::Io(e)
        }
    }

    /// Runs ffmpeg to completion, optionally feeding `stdin`, and returns its output.
    async fn run(&self, args: &[String], stdin: Option<Vec<u8>>) -> Result<Output, ConverterError> {
        debug!("ffmpeg {}", args.join(" "));

        let mut cmd = self.command();
        cmd.args(args).stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;

        // Feed stdin from a separate task so a full stdout pipe cannot deadlock us.
        let writer = match (stdin, child.stdin.take()) {
            (Some(bytes), Some(mut pipe)) => Some(tokio::spawn(async move {
                let result = pipe.write_all(&bytes).await;
                drop(pipe);
                result
            })),
            _ => None,
        };

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let output = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        };

        if let Some(writer) = writer {
            // A broken pipe here means ffmpeg stopped reading; its exit status says why.
            if let Ok(Err(e)) = writer.await {
                debug!("ffmpeg stdin closed early: {}", e);
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ConverterError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", output.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        Ok(output)
    }
}

fn tagged_temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tagging");
    path.with_file_name(name)
}

#[async_trait]
impl Transcoder for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(&self, job: TranscodeJob) -> Result<TranscodeResult, ConverterError> {
        let start = Instant::now();

        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        // Ensure output directory exists
        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                ConverterError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        let args = self.build_transcode_args(&job.input_path, &job.output_path);
        self.run(&args, None).await?;

        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| ConverterError::conversion_failed("Output file not created", None))?;

        Ok(TranscodeResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        Ok(())
    }
}

#[async_trait]
impl TagWriter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn tag_file(&self, path: &Path, tags: &EmbeddedMetadata) -> Result<(), ConverterError> {
        if !path.exists() {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let tmp = tagged_temp_path(path);
        let args = self.build_tag_args(
            &path.to_string_lossy(),
            &tmp.to_string_lossy(),
            tags,
        );
        if let Err(e) = self.run(&args, None).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn tag_bytes(
        &self,
        audio: Vec<u8>,
        tags: &EmbeddedMetadata,
    ) -> Result<Vec<u8>, ConverterError> {
        let args = self.build_tag_args("pipe:0", "pipe:1", tags);
        let output = self.run(&args, Some(audio)).await?;
        if output.stdout.is_empty() {
            return Err(ConverterError::conversion_failed(
                "FFmpeg produced no output",
                None,
            ));
        }
        Ok(output.stdout)
    }
}
