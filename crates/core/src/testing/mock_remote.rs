//! Mock remote source for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::remote::{RemoteError, RemoteLocator, RemoteSource};

/// Mock implementation of [`RemoteSource`].
///
/// Writes deterministic bytes (`remote:<video id>` unless overridden) to the
/// destination, records every locator it was asked for, and tracks how many
/// fetches ran at the same time.
#[derive(Debug, Clone, Default)]
pub struct MockRemoteSource {
    calls: Arc<RwLock<Vec<RemoteLocator>>>,
    payloads: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    delay: Arc<RwLock<Duration>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl MockRemoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes a fetch writes for this video id.
    pub fn payload_for(video_id: &str) -> Vec<u8> {
        format!("remote:{}", video_id).into_bytes()
    }

    pub async fn set_payload(&self, video_id: &str, bytes: impl Into<Vec<u8>>) {
        self.payloads
            .write()
            .await
            .insert(video_id.to_string(), bytes.into());
    }

    /// Makes every fetch of `video_id` fail.
    pub async fn fail_on(&self, video_id: &str) {
        self.failing.write().await.insert(video_id.to_string());
    }

    /// How long each fetch takes.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn calls(&self) -> Vec<RemoteLocator> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Whether `video_id` was ever fetched.
    pub async fn was_called_for(&self, video_id: &str) -> bool {
        self.calls.read().await.iter().any(|l| l.video_id == video_id)
    }

    /// Highest number of fetches observed running at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteSource for MockRemoteSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_audio(&self, locator: &RemoteLocator, dest: &Path) -> Result<u64, RemoteError> {
        self.calls.write().await.push(locator.clone());

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.active);
        self.max_active.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().await.contains(&locator.video_id) {
            return Err(RemoteError::download_failed(
                &locator.url,
                "mock failure",
                None,
            ));
        }

        let bytes = self
            .payloads
            .read()
            .await
            .get(&locator.video_id)
            .cloned()
            .unwrap_or_else(|| Self::payload_for(&locator.video_id));

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}
