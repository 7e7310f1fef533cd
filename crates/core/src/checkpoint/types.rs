use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::CheckpointError;

/// State of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Waiting,
    InFlight,
    Done,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Waiting => write!(f, "waiting"),
            TaskState::InFlight => write!(f, "in_flight"),
            TaskState::Done => write!(f, "done"),
        }
    }
}

/// Durable snapshot of the three id sets.
///
/// Serialized as `{ "waitingIds": [..], "downloadingIds": [..], "doneIds": [..] }`.
/// Order within each set is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(default)]
    pub waiting_ids: Vec<String>,
    #[serde(default)]
    pub downloading_ids: Vec<String>,
    #[serde(default)]
    pub done_ids: Vec<String>,
}

impl Checkpoint {
    /// Loads a checkpoint, failing with `NotFound` when no prior run left one.
    pub async fn load(path: &Path) -> Result<Self, CheckpointError> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Writes the checkpoint, replacing any prior file via a sibling temp file and rename.
    ///
    /// Synchronous so it can run from a panic hook.
    pub fn write_to(&self, path: &Path) -> Result<(), CheckpointError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = temp_path(path);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn progress(&self) -> Progress {
        Progress {
            waiting: self.waiting_ids.len(),
            in_flight: self.downloading_ids.len(),
            done: self.done_ids.len(),
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Set sizes at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub waiting: usize,
    pub in_flight: usize,
    pub done: usize,
}

impl Progress {
    pub fn total(&self) -> usize {
        self.waiting + self.in_flight + self.done
    }

    /// Whole percent of tasks done. An empty universe counts as complete.
    pub fn percent(&self) -> u8 {
        let total = self.total();
        if total == 0 {
            return 100;
        }
        (self.done * 100 / total) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.waiting == 0 && self.in_flight == 0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}% (Waiting: {}, Downloading: {}, Done: {})",
            self.percent(),
            self.waiting,
            self.in_flight,
            self.done
        )
    }
}

/// A single state change, published to the observer after it is applied.
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub id: String,
    pub state: TaskState,
    pub progress: Progress,
    pub at: DateTime<Utc>,
}

/// Observer invoked after every transition.
pub type ProgressCallback = Arc<dyn Fn(&Transition) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_wire_names() {
        let checkpoint = Checkpoint {
            waiting_ids: vec!["Bgm00/A".to_string()],
            downloading_ids: vec!["Bgm00/B".to_string()],
            done_ids: vec![],
        };
        let value = serde_json::to_value(&checkpoint).unwrap();
        assert_eq!(value["waitingIds"][0], "Bgm00/A");
        assert_eq!(value["downloadingIds"][0], "Bgm00/B");
        assert!(value["doneIds"].as_array().unwrap().is_empty());
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = Checkpoint::load(&dir.path().join("build.json")).await;
        assert!(matches!(result, Err(CheckpointError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("build.json");
        let checkpoint = Checkpoint {
            waiting_ids: vec!["Bgm01/X".to_string()],
            downloading_ids: vec![],
            done_ids: vec!["Bgm00/A".to_string(), "Bgm00/B".to_string()],
        };

        checkpoint.write_to(&path).unwrap();
        assert!(!dir.path().join("nested").join("build.json.tmp").exists());

        let loaded = Checkpoint::load(&path).await.unwrap();
        assert_eq!(loaded, checkpoint);
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let result = Checkpoint::load(&path).await;
        assert!(matches!(result, Err(CheckpointError::Parse(_))));
    }

    #[test]
    fn test_progress_display() {
        let progress = Progress {
            waiting: 5,
            in_flight: 2,
            done: 3,
        };
        assert_eq!(progress.total(), 10);
        assert_eq!(
            progress.to_string(),
            "30% (Waiting: 5, Downloading: 2, Done: 3)"
        );
        assert!(!progress.is_complete());
        assert_eq!(Progress::default().percent(), 100);
    }
}
