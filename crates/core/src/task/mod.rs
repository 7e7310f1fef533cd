//! Acquisition tasks and the registry that derives them from a manifest.
//!
//! A task is one output file, keyed by `group/name`. The registry filters the
//! manifest down to entries with a usable source, builds an id → task index and
//! subtracts whatever a prior checkpoint already finished.

mod manifest;
mod registry;
mod types;

pub use manifest::{
    fetch_manifest, load_manifest_file, EntryMetadata, EntrySource, ManifestEntry, ManifestError,
};
pub use registry::{build_registry, TaskRegistry};
pub use types::{task_id, DisplayMetadata, SourceDescriptor, Task, TaskId, TaskIndex};
