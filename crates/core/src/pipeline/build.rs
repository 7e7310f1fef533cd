use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::checkpoint::{Checkpoint, CheckpointStore, Progress, ProgressCallback};
use crate::config::Config;
use crate::container::{AssetContainer, DirContainer};
use crate::converter::FfmpegConverter;
use crate::engine::{ExecutionEngine, TaskFailure};
use crate::remote::YtDlpSource;
use crate::resolver::{Collaborators, ResolveError, ResolverSettings, SourceResolver};
use crate::task::{build_registry, ManifestEntry};

/// Summary of one build run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Tasks satisfied from local containers.
    pub local_done: usize,
    /// Tasks acquired remotely.
    pub remote_done: usize,
    pub failed: Vec<TaskFailure>,
    /// Set sizes after the run.
    pub progress: Progress,
}

/// Builds runs from configuration and a set of collaborators.
pub struct BuildPipeline {
    config: Config,
    collaborators: Collaborators,
    observer: Option<ProgressCallback>,
}

impl BuildPipeline {
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            observer: None,
        }
    }

    /// Uses the on-disk containers, yt-dlp and ffmpeg named by `config`.
    pub fn from_config(config: Config) -> Self {
        let containers: Vec<Arc<dyn AssetContainer>> = if config.local.enabled {
            config
                .local
                .containers
                .iter()
                .map(|name| {
                    Arc::new(DirContainer::new(config.paths.containers_dir.join(name)))
                        as Arc<dyn AssetContainer>
                })
                .collect()
        } else {
            Vec::new()
        };
        let converter = Arc::new(FfmpegConverter::new(config.converter.clone()));

        let collaborators = Collaborators {
            containers,
            remote: Arc::new(YtDlpSource::new(config.remote.clone())),
            transcoder: converter.clone(),
            tagger: converter,
        };
        Self::new(config, collaborators)
    }

    /// Sets the callback notified after every state transition.
    pub fn with_observer(mut self, observer: ProgressCallback) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Derives the task universe and the shared store for one run.
    ///
    /// The returned [`Build`] exposes the store before any work starts, so a
    /// termination hook can be attached to it.
    pub fn prepare(&self, entries: &[ManifestEntry], prior: Option<&Checkpoint>) -> Build {
        let registry = build_registry(entries, prior, &self.config.paths.output_dir);

        let mut store = CheckpointStore::new(registry.waiting_ids, registry.done_ids);
        if let Some(observer) = &self.observer {
            store = store.with_observer(Arc::clone(observer));
        }
        info!("Starting build: {}", store.progress());

        let resolver = SourceResolver::new(
            store,
            Arc::new(registry.index),
            self.collaborators.clone(),
            ResolverSettings::from_config(&self.config),
        );
        let engine = ExecutionEngine::new(resolver.clone(), &self.config.engine);

        Build {
            resolver,
            engine,
            local_enabled: self.config.local.enabled,
        }
    }
}

/// A prepared run.
pub struct Build {
    resolver: SourceResolver,
    engine: ExecutionEngine,
    local_enabled: bool,
}

impl Build {
    pub fn store(&self) -> &CheckpointStore {
        self.resolver.store()
    }

    /// Runs local extraction, then drains what is left remotely.
    ///
    /// Only staging failures and a missing transcoder abort the run; per-task
    /// failures are reported.
    pub async fn run(&self) -> Result<RunReport, ResolveError> {
        self.resolver.prepare_staging().await?;

        let local_done = if self.local_enabled {
            self.resolver.extract_local().await.extracted
        } else {
            0
        };

        let remaining = self.store().waiting_ids();
        if !remaining.is_empty() {
            if let Err(e) = self.resolver.validate_tools().await {
                self.resolver.remove_staging().await;
                return Err(e);
            }
        }
        let engine_report = self.engine.run(remaining).await;
        self.resolver.remove_staging().await;

        Ok(RunReport {
            local_done,
            remote_done: engine_report.completed.len(),
            failed: engine_report.failed,
            progress: self.store().progress(),
        })
    }
}
