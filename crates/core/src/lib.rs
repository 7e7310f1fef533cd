pub mod checkpoint;
pub mod config;
pub mod container;
pub mod converter;
pub mod engine;
pub mod pipeline;
pub mod remote;
pub mod resolver;
pub mod task;
pub mod testing;

pub use checkpoint::{
    Checkpoint, CheckpointError, CheckpointStore, Progress, ProgressCallback, TaskState,
    TerminationHook, TerminationReason, Transition,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use engine::{EngineConfig, EngineReport, ExecutionEngine};
pub use pipeline::{Build, BuildPipeline, RunReport};
pub use resolver::{Collaborators, ResolveError, SourceResolver};
pub use task::{build_registry, fetch_manifest, load_manifest_file, ManifestEntry, Task, TaskId};
