//! Source resolution: turning a waiting task id into a tagged file on disk.
//!
//! Two strategies, tried in this order:
//!
//! - **Local extraction** ([`SourceResolver::extract_local`]) scans every
//!   configured container once, before any remote work is scheduled, and
//!   satisfies every waiting id it can find a payload for.
//! - **Remote acquisition** ([`SourceResolver::acquire_remote`]) downloads,
//!   transcodes and tags one task. The execution engine drives it with
//!   bounded concurrency.

mod error;
mod local;
mod place;
mod remote;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::checkpoint::CheckpointStore;
use crate::config::Config;
use crate::container::AssetContainer;
use crate::converter::{TagWriter, Transcoder};
use crate::remote::RemoteSource;
use crate::task::TaskIndex;

pub use error::ResolveError;
pub use local::LocalReport;

/// Knobs the resolver needs from configuration.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Prefix joined with a task's remote id.
    pub locator_base: String,
    /// Container entries outside this category are skipped.
    pub category_prefix: String,
    /// Where downloads and intermediate files are staged.
    pub staging_dir: PathBuf,
    /// Upper bound for one remote acquisition. `None` waits forever.
    pub download_timeout: Option<Duration>,
}

impl ResolverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            locator_base: config.remote.locator_base.clone(),
            category_prefix: config.local.category_prefix.clone(),
            staging_dir: config.paths.staging_dir(),
            download_timeout: config.engine.download_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// The external collaborators a resolver drives.
#[derive(Clone)]
pub struct Collaborators {
    pub containers: Vec<Arc<dyn AssetContainer>>,
    pub remote: Arc<dyn RemoteSource>,
    pub transcoder: Arc<dyn Transcoder>,
    pub tagger: Arc<dyn TagWriter>,
}

/// Resolves tasks against the shared checkpoint store.
#[derive(Clone)]
pub struct SourceResolver {
    store: CheckpointStore,
    index: Arc<TaskIndex>,
    collaborators: Collaborators,
    settings: ResolverSettings,
}

impl SourceResolver {
    pub fn new(
        store: CheckpointStore,
        index: Arc<TaskIndex>,
        collaborators: Collaborators,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            store,
            index,
            collaborators,
            settings,
        }
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Clears leftovers from an interrupted run and recreates the staging dir.
    pub async fn prepare_staging(&self) -> Result<(), ResolveError> {
        let dir = &self.settings.staging_dir;
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => tracing::debug!("Cleared stale staging dir {:?}", dir),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tokio::fs::create_dir_all(dir).await?;
        Ok(())
    }

    /// Checks that the transcoder can run before any remote work is scheduled.
    pub async fn validate_tools(&self) -> Result<(), ResolveError> {
        self.collaborators.transcoder.validate().await?;
        Ok(())
    }

    /// Removes the staging dir once no acquisition is running.
    pub async fn remove_staging(&self) {
        let dir = &self.settings.staging_dir;
        if let Err(e) = tokio::fs::remove_dir_all(dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("Failed to remove staging dir {:?}: {}", dir, e);
            }
        }
    }
}
