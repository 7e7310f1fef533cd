//! yt-dlp backed remote source.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::RemoteConfig;

use super::error::RemoteError;
use super::locator::RemoteLocator;
use super::traits::RemoteSource;

/// Downloads audio by shelling out to `yt-dlp`.
pub struct YtDlpSource {
    config: RemoteConfig,
}

impl YtDlpSource {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    fn build_args(&self, locator: &RemoteLocator, dest: &Path) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "-f".to_string(),
            self.config.format.clone(),
            "-o".to_string(),
            dest.to_string_lossy().to_string(),
            locator.url.clone(),
        ]
    }
}

#[async_trait]
impl RemoteSource for YtDlpSource {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch_audio(&self, locator: &RemoteLocator, dest: &Path) -> Result<u64, RemoteError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(locator, dest);
        debug!("yt-dlp {}", args.join(" "));

        let output = Command::new(&self.config.yt_dlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RemoteError::ToolNotFound {
                        path: self.config.yt_dlp_path.clone(),
                    }
                } else {
                    RemoteError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RemoteError::download_failed(
                &locator.url,
                format!("yt-dlp exited with code: {:?}", output.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        let size = tokio::fs::metadata(dest)
            .await
            .map_err(|_| RemoteError::download_failed(&locator.url, "no file was written", None))?
            .len();
        Ok(size)
    }
}
