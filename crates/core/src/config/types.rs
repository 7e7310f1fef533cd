use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::converter::ConverterConfig;
use crate::engine::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub seed: Option<SeedConfig>,
}

/// Filesystem locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Root of the published output tree.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory holding the local asset containers.
    #[serde(default = "default_containers_dir")]
    pub containers_dir: PathBuf,
    /// Checkpoint file. Defaults to `<output_dir>/build.json`.
    #[serde(default)]
    pub checkpoint_file: Option<PathBuf>,
    /// Staging area for remote downloads. Defaults to `<output_dir>/.partial`.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl PathsConfig {
    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join("build.json"))
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join(".partial"))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            containers_dir: default_containers_dir(),
            checkpoint_file: None,
            temp_dir: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_containers_dir() -> PathBuf {
    PathBuf::from("wz")
}

/// Manifest source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestConfig {
    /// Published manifest URL.
    #[serde(default = "default_manifest_url")]
    pub url: String,
    /// Local manifest file, used instead of `url` when set.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// HTTP timeout in seconds.
    #[serde(default = "default_manifest_timeout")]
    pub timeout_secs: u64,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            url: default_manifest_url(),
            path: None,
            timeout_secs: default_manifest_timeout(),
        }
    }
}

impl ManifestConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn default_manifest_url() -> String {
    "https://raw.githubusercontent.com/maplestory-music/maplebgm-db/prod/bgm.min.json".to_string()
}

fn default_manifest_timeout() -> u64 {
    30
}

/// Local asset container configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalConfig {
    /// Whether to attempt local extraction at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Container names, resolved against `paths.containers_dir`.
    #[serde(default = "default_containers")]
    pub containers: Vec<String>,
    /// Only entries whose name starts with this prefix carry sound nodes.
    #[serde(default = "default_category_prefix")]
    pub category_prefix: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            containers: default_containers(),
            category_prefix: default_category_prefix(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_containers() -> Vec<String> {
    vec!["Sound.wz".to_string(), "Sound2.wz".to_string()]
}

fn default_category_prefix() -> String {
    "Bgm".to_string()
}

/// Remote video source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: PathBuf,
    /// Prefix joined with a task's video id to build its locator.
    #[serde(default = "default_locator_base")]
    pub locator_base: String,
    /// yt-dlp format selector.
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: default_yt_dlp_path(),
            locator_base: default_locator_base(),
            format: default_format(),
        }
    }
}

fn default_yt_dlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_locator_base() -> String {
    "https://youtu.be/".to_string()
}

fn default_format() -> String {
    "bestaudio".to_string()
}

/// Output directory seeding from a previously published branch
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedConfig {
    /// Git repository holding the published output.
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_git_path")]
    pub git_path: PathBuf,
}

fn default_branch() -> String {
    "gh-pages".to_string()
}

fn default_git_path() -> PathBuf {
    PathBuf::from("git")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        assert_eq!(config.paths.output_dir, PathBuf::from("dist"));
        assert_eq!(
            config.paths.checkpoint_path(),
            PathBuf::from("dist/build.json")
        );
        assert_eq!(config.paths.staging_dir(), PathBuf::from("dist/.partial"));
    }

    #[test]
    fn test_explicit_checkpoint_file() {
        let toml = r#"
[paths]
output_dir = "out"
checkpoint_file = "state/build.json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.paths.checkpoint_path(),
            PathBuf::from("state/build.json")
        );
        assert_eq!(config.paths.staging_dir(), PathBuf::from("out/.partial"));
    }

    #[test]
    fn test_deserialize_local_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.local.enabled);
        assert_eq!(config.local.containers, vec!["Sound.wz", "Sound2.wz"]);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_deserialize_seed_config() {
        let toml = r#"
[seed]
repo = "https://github.com/maple-pod/bgm.git"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let seed = config.seed.unwrap();
        assert_eq!(seed.repo, "https://github.com/maple-pod/bgm.git");
        assert_eq!(seed.branch, "gh-pages");
        assert_eq!(seed.git_path, PathBuf::from("git"));
    }

    #[test]
    fn test_deserialize_manifest_path() {
        let toml = r#"
[manifest]
path = "bgm.json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.manifest.path, Some(PathBuf::from("bgm.json")));
        assert_eq!(config.manifest.timeout_secs, 30);
    }
}
