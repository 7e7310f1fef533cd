//! Local extraction from game asset containers.

use tracing::{debug, info, warn};

use super::error::ResolveError;
use super::place::write_file;
use super::SourceResolver;
use crate::container::{entry_group, AssetContainer, Extraction, SoundNode};
use crate::task::{task_id, Task};

/// Outcome of one local extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalReport {
    /// Tasks satisfied from a container.
    pub extracted: usize,
    /// Nodes that matched a waiting task but held no audio.
    pub no_data: usize,
    /// Nodes that matched a waiting task but failed to extract, tag or write.
    pub failed: usize,
}

impl SourceResolver {
    /// Satisfies every waiting task found in the configured containers.
    ///
    /// Each task is written, tagged, before it leaves the waiting set. A task
    /// whose extraction fails stays waiting and falls through to the remote
    /// path. Unreadable containers are skipped with a warning.
    pub async fn extract_local(&self) -> LocalReport {
        let mut report = LocalReport::default();

        for container in &self.collaborators.containers {
            if let Err(e) = self.scan_container(container.as_ref(), &mut report).await {
                warn!("Skipping container {}: {}", container.name(), e);
            }
        }

        info!(
            "Local extraction finished: {} extracted, {} without data, {} failed",
            report.extracted, report.no_data, report.failed
        );
        report
    }

    async fn scan_container(
        &self,
        container: &dyn AssetContainer,
        report: &mut LocalReport,
    ) -> Result<(), ResolveError> {
        let prefix = self.settings.category_prefix.as_str();
        let entries = container.entries().await?;

        for entry in entries.iter().filter(|e| e.starts_with(prefix)) {
            let nodes = match container.sound_nodes(entry).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!("Skipping {}/{}: {}", container.name(), entry, e);
                    continue;
                }
            };

            for node in nodes {
                let id = task_id(entry_group(&node.entry), &node.name);
                if !self.store.is_waiting(&id) {
                    continue;
                }
                let Some(task) = self.index.get(&id) else {
                    continue;
                };

                match self.extract_one(container, &node, task).await {
                    Ok(true) => report.extracted += 1,
                    Ok(false) => {
                        debug!("{} has no data in {}", id, container.name());
                        report.no_data += 1;
                    }
                    Err(e) => {
                        warn!("Local extraction of {} failed: {}", id, e);
                        report.failed += 1;
                    }
                }
            }
        }

        Ok(())
    }

    /// Returns `Ok(false)` when the node has no payload.
    async fn extract_one(
        &self,
        container: &dyn AssetContainer,
        node: &SoundNode,
        task: &Task,
    ) -> Result<bool, ResolveError> {
        let audio = match container.extract(node).await? {
            Extraction::Audio(bytes) => bytes,
            Extraction::NoData => return Ok(false),
        };

        let tagged = self.collaborators.tagger.tag_bytes(audio, &task.tags()).await?;
        write_file(&task.target_path, &tagged).await?;

        self.store.mark_in_flight(&task.id)?;
        self.store.mark_done(&task.id)?;
        debug!("Extracted {} from {}", task.id, container.name());
        Ok(true)
    }
}
