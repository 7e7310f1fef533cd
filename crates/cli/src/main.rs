mod progress;
mod seed;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bgmbuild_core::{
    fetch_manifest, load_config, load_config_or_default, load_manifest_file, validate_config,
    BuildPipeline, Checkpoint, Config, ManifestEntry, TerminationHook,
};

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "BGMBUILD_CONFIG";

/// Config file used when `BGMBUILD_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "bgmbuild.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let json = std::env::var("BGMBUILD_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run() -> Result<()> {
    init_logging();

    let config = load(std::env::var(CONFIG_ENV).ok().map(PathBuf::from))?;
    validate_config(&config).context("Configuration validation failed")?;
    debug!(
        "Effective configuration: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );

    let checkpoint_path = config.paths.checkpoint_path();
    let prior = load_prior(&config, &checkpoint_path).await?;
    let entries = load_manifest(&config).await?;

    let pipeline = BuildPipeline::from_config(config).with_observer(progress::reporter());
    let build = pipeline.prepare(&entries, prior.as_ref());

    let result = TerminationHook::new(build.store().clone(), &checkpoint_path)
        .supervise(build.run())
        .await
        .context("Failed to supervise build")?;
    build
        .store()
        .flush(&checkpoint_path)
        .with_context(|| format!("Failed to save checkpoint to {:?}", checkpoint_path))?;
    let report = result.context("Build failed")?;

    for failure in &report.failed {
        warn!("{} failed during {}: {}", failure.id, failure.stage, failure.error);
    }

    if report.progress.is_complete() {
        info!(
            "Finished building BGM repo ({} local, {} remote, {} total)",
            report.local_done,
            report.remote_done,
            report.progress.done
        );
    } else {
        warn!(
            "Build incomplete, {} tasks left for the next run: {}",
            report.progress.waiting + report.progress.in_flight,
            report.progress
        );
    }
    Ok(())
}

/// An explicit config path must exist; the default path is optional.
fn load(explicit: Option<PathBuf>) -> Result<Config> {
    match explicit {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            load_config_or_default(path)
                .with_context(|| format!("Failed to load config from {:?}", path))
        }
    }
}

/// Loads the prior checkpoint, seeding the output tree first if none exists.
async fn load_prior(config: &Config, path: &Path) -> Result<Option<Checkpoint>> {
    match Checkpoint::load(path).await {
        Ok(checkpoint) => {
            info!("Resuming from {:?}: {}", path, checkpoint.progress());
            return Ok(Some(checkpoint));
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e).with_context(|| format!("Failed to read checkpoint {:?}", path)),
    }

    let Some(seed) = &config.seed else {
        info!("No checkpoint at {:?}, starting fresh", path);
        return Ok(None);
    };

    let output_dir = &config.paths.output_dir;
    seed::seed_output(seed, output_dir)
        .await
        .context("Failed to seed output directory")?;

    match Checkpoint::load(path).await {
        Ok(checkpoint) => {
            seed::assume_unchanged(seed, output_dir, &checkpoint.done_ids)
                .await
                .context("Failed to mark published files")?;
            info!("Seeded from {}: {}", seed.repo, checkpoint.progress());
            Ok(Some(checkpoint))
        }
        Err(e) if e.is_not_found() => {
            warn!("Seed repository has no checkpoint, starting fresh");
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read checkpoint {:?}", path)),
    }
}

async fn load_manifest(config: &Config) -> Result<Vec<ManifestEntry>> {
    match &config.manifest.path {
        Some(path) => load_manifest_file(path)
            .await
            .with_context(|| format!("Failed to load manifest from {:?}", path)),
        None => fetch_manifest(&config.manifest.url, config.manifest.timeout())
            .await
            .with_context(|| format!("Failed to fetch manifest from {}", config.manifest.url)),
    }
}
