//! Remote acquisition: download, transcode, tag, place.

use std::path::PathBuf;
use tracing::{debug, info};

use super::error::ResolveError;
use super::place::place_file;
use super::SourceResolver;
use crate::converter::TranscodeJob;
use crate::remote::RemoteLocator;
use crate::task::Task;

/// Staging files for one task.
struct Staged {
    download: PathBuf,
    encoded: PathBuf,
}

impl Staged {
    async fn cleanup(&self) {
        for path in [&self.download, &self.encoded] {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!("Failed to remove staging file {:?}: {}", path, e);
                }
            }
        }
    }
}

/// Flat, collision-free file stem for an id.
fn staging_stem(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

impl SourceResolver {
    /// Acquires one task from its remote source.
    ///
    /// The task moves to in flight before any network work starts and to done
    /// only once the tagged file sits at its target path. On failure the task
    /// is left in flight; the next run re-queues it.
    pub async fn acquire_remote(&self, id: &str) -> Result<(), ResolveError> {
        let task = self
            .index
            .get(id)
            .ok_or_else(|| ResolveError::UnknownTask(id.to_string()))?;

        self.store.mark_in_flight(id)?;

        let staged = self.staged_paths(task);
        let result = match self.settings.download_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.fetch_and_place(task, &staged)).await {
                Ok(result) => result,
                Err(_) => Err(ResolveError::Timeout {
                    timeout_secs: limit.as_secs(),
                }),
            },
            None => self.fetch_and_place(task, &staged).await,
        };
        staged.cleanup().await;
        result?;

        self.store.mark_done(id)?;
        Ok(())
    }

    fn staged_paths(&self, task: &Task) -> Staged {
        let stem = staging_stem(&task.id);
        Staged {
            download: self.settings.staging_dir.join(format!("{}.src", stem)),
            encoded: self.settings.staging_dir.join(format!("{}.mp3", stem)),
        }
    }

    async fn fetch_and_place(&self, task: &Task, staged: &Staged) -> Result<(), ResolveError> {
        let locator = RemoteLocator::parse(&self.settings.locator_base, &task.source.remote_id)?;

        info!("Downloading {} from {}", task.id, locator);
        let bytes = self
            .collaborators
            .remote
            .fetch_audio(&locator, &staged.download)
            .await?;
        debug!("Fetched {} bytes for {}", bytes, task.id);

        let result = self
            .collaborators
            .transcoder
            .transcode(TranscodeJob {
                job_id: task.id.clone(),
                input_path: staged.download.clone(),
                output_path: staged.encoded.clone(),
            })
            .await?;
        debug!(
            "Transcoded {} in {}ms ({} bytes)",
            task.id, result.duration_ms, result.output_size_bytes
        );

        self.collaborators
            .tagger
            .tag_file(&staged.encoded, &task.tags())
            .await?;

        place_file(&staged.encoded, &task.target_path).await?;
        info!("Finished {}", task.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_stem_is_flat_and_distinct() {
        let a = staging_stem("a__b/c");
        let b = staging_stem("a/b__c");
        assert_ne!(a, b);
        assert!(!a.contains('/') && !b.contains('/'));
        assert_eq!(staging_stem("Bgm00/Floral Life"), "Bgm00%2FFloral%20Life");
        assert!(!staging_stem("Bgm00\\..\\x").contains('\\'));
    }
}
