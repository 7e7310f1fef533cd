use std::path::{Component, Path, PathBuf};

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Engine concurrency is not 0
/// - Remote locator base is not empty
/// - Local category prefix is not empty when local extraction is enabled
/// - The staging dir, which is wiped on every run, holds neither the output
///   tree nor the checkpoint file
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.engine.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "engine.concurrency cannot be 0".to_string(),
        ));
    }

    if config.remote.locator_base.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "remote.locator_base cannot be empty".to_string(),
        ));
    }

    if config.local.enabled && config.local.category_prefix.is_empty() {
        return Err(ConfigError::ValidationError(
            "local.category_prefix cannot be empty".to_string(),
        ));
    }

    let staging = normalize(&config.paths.staging_dir())?;
    if normalize(&config.paths.output_dir)?.starts_with(&staging) {
        return Err(ConfigError::ValidationError(format!(
            "paths.temp_dir {:?} must not be paths.output_dir or one of its parents",
            config.paths.staging_dir()
        )));
    }
    if normalize(&config.paths.checkpoint_path())?.starts_with(&staging) {
        return Err(ConfigError::ValidationError(format!(
            "paths.checkpoint_file {:?} must not live under paths.temp_dir",
            config.paths.checkpoint_path()
        )));
    }

    Ok(())
}

/// Absolute form of `path` with `.` and `..` resolved lexically.
fn normalize(path: &Path) -> Result<PathBuf, ConfigError> {
    let absolute = std::path::absolute(path).map_err(|e| {
        ConfigError::ValidationError(format!("cannot resolve path {:?}: {}", path, e))
    })?;
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}
