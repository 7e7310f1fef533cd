use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use crate::checkpoint::Checkpoint;

use super::manifest::ManifestEntry;
use super::types::{task_id, DisplayMetadata, SourceDescriptor, Task, TaskId, TaskIndex};

/// Extension of every output file.
const OUTPUT_EXTENSION: &str = "mp3";

/// The task universe for one run.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    /// Every eligible task, including ones a prior run already finished.
    pub index: TaskIndex,
    /// Eligible ids not yet done, in manifest order.
    pub waiting_ids: Vec<TaskId>,
    /// Done ids carried over from the prior checkpoint, in their original order.
    pub done_ids: Vec<TaskId>,
}

/// Builds the task universe from the manifest and an optional prior checkpoint.
///
/// Entries without a remote id or without a composite key never become tasks.
/// Ids the prior checkpoint lists as in flight are not treated as done, so they
/// land back in `waiting_ids`.
pub fn build_registry(
    entries: &[ManifestEntry],
    prior: Option<&Checkpoint>,
    output_dir: &Path,
) -> TaskRegistry {
    let prior_done: HashSet<&str> = prior
        .map(|c| c.done_ids.iter().map(String::as_str).collect())
        .unwrap_or_default();

    let mut index = TaskIndex::default();
    let mut waiting_ids = Vec::new();
    let mut skipped = 0usize;

    for entry in entries {
        let Some(task) = task_from_entry(entry, output_dir) else {
            skipped += 1;
            continue;
        };
        let id = task.id.clone();
        if !index.insert(task) {
            warn!("Duplicate manifest entry for {}, keeping the first", id);
            continue;
        }
        if !prior_done.contains(id.as_str()) {
            waiting_ids.push(id);
        }
    }

    let done_ids = prior.map(|c| c.done_ids.clone()).unwrap_or_default();

    debug!(
        "Registry: {} eligible, {} waiting, {} done, {} without a source",
        index.len(),
        waiting_ids.len(),
        done_ids.len(),
        skipped
    );

    TaskRegistry {
        index,
        waiting_ids,
        done_ids,
    }
}

fn task_from_entry(entry: &ManifestEntry, output_dir: &Path) -> Option<Task> {
    let remote_id = entry.youtube.trim();
    // Ids are keyed on the raw fields so they match checkpoints written by earlier runs.
    let group = entry.source.structure.as_str();
    let name = entry.filename.as_str();
    if remote_id.is_empty() || group.trim().is_empty() || name.trim().is_empty() {
        return None;
    }

    Some(Task {
        id: task_id(group, name),
        name: name.to_string(),
        metadata: DisplayMetadata {
            artist: entry.metadata.artist.clone(),
            title: entry.metadata.title.clone(),
            year: entry.metadata.year.clone(),
            album_artist: entry.metadata.album_artist.clone(),
            title_alt: entry.metadata.title_alt.clone(),
        },
        source: SourceDescriptor {
            group: group.to_string(),
            remote_id: remote_id.to_string(),
            client: entry.source.client.clone(),
        },
        target_path: output_dir
            .join(group)
            .join(format!("{}.{}", name, OUTPUT_EXTENSION)),
    })
}
