use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::converter::EmbeddedMetadata;

/// Composite task key, `group/name`.
pub type TaskId = String;

/// Builds the composite id for a task.
pub fn task_id(group: &str, name: &str) -> TaskId {
    format!("{}/{}", group, name)
}

/// Display metadata carried over from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetadata {
    pub artist: String,
    pub title: String,
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_alt: Option<String>,
}

/// Where a task's audio can come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Container group (folder) name, also the first half of the task id.
    pub group: String,
    /// Remote video identifier.
    pub remote_id: String,
    /// Game client the entry was sourced from. Informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

/// One unit of acquisition work. Immutable once derived from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Asset name within the group.
    pub name: String,
    pub metadata: DisplayMetadata,
    pub source: SourceDescriptor,
    /// Final location of the tagged file.
    pub target_path: PathBuf,
}

impl Task {
    /// Tags embedded into the output file. Only artist, title and year are written.
    pub fn tags(&self) -> EmbeddedMetadata {
        EmbeddedMetadata {
            artist: Some(self.metadata.artist.clone()),
            title: Some(self.metadata.title.clone()),
            year: Some(self.metadata.year.clone()).filter(|y| !y.is_empty()),
        }
    }
}

/// Read-only id → task lookup built once per run.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex {
    tasks: HashMap<TaskId, Task>,
}

impl TaskIndex {
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Inserts a task unless its id is already present. Returns whether it was inserted.
    pub(crate) fn insert(&mut self, task: Task) -> bool {
        if self.tasks.contains_key(&task.id) {
            return false;
        }
        self.tasks.insert(task.id.clone(), task);
        true
    }
}

impl FromIterator<Task> for TaskIndex {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        let mut index = TaskIndex::default();
        for task in iter {
            index.insert(task);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(year: &str) -> Task {
        Task {
            id: task_id("Bgm00", "SleepyWood"),
            name: "SleepyWood".to_string(),
            metadata: DisplayMetadata {
                artist: "Wizet".to_string(),
                title: "Sleepy Wood".to_string(),
                year: year.to_string(),
                album_artist: Some("Wizet".to_string()),
                title_alt: None,
            },
            source: SourceDescriptor {
                group: "Bgm00".to_string(),
                remote_id: "abcdefghijk".to_string(),
                client: Some("GMS".to_string()),
            },
            target_path: PathBuf::from("dist/Bgm00/SleepyWood.mp3"),
        }
    }

    #[test]
    fn test_task_id() {
        assert_eq!(task_id("Bgm00", "SleepyWood"), "Bgm00/SleepyWood");
    }

    #[test]
    fn test_tags_only_carry_artist_title_year() {
        let tags = task("2003").tags();
        assert_eq!(tags.artist.as_deref(), Some("Wizet"));
        assert_eq!(tags.title.as_deref(), Some("Sleepy Wood"));
        assert_eq!(tags.year.as_deref(), Some("2003"));
    }

    #[test]
    fn test_tags_skip_empty_year() {
        assert!(task("").tags().year.is_none());
    }

    #[test]
    fn test_index_first_insert_wins() {
        let mut index = TaskIndex::default();
        assert!(index.insert(task("2003")));
        assert!(!index.insert(task("2010")));
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("Bgm00/SleepyWood").unwrap().metadata.year, "2003");
    }
}
