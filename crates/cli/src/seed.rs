//! Seeding the output directory from the published branch.
//!
//! Mirrors a partial clone of the published repository into the output dir so
//! files finished by earlier builds are not rebuilt. Only `build.json` and
//! `.gitignore` are checked out; published audio is left in the index and
//! marked assume-unchanged so it does not show up as deleted.

use std::path::Path;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

use bgmbuild_core::config::SeedConfig;

/// Files restored from the published branch.
const CHECKOUT_FILES: [&str; 2] = ["build.json", ".gitignore"];

/// Ids marked per `update-index` call, to stay under argv limits.
const UPDATE_INDEX_CHUNK: usize = 500;

fn clone_args(seed: &SeedConfig, output_dir: &Path) -> Vec<String> {
    vec![
        "clone".to_string(),
        "-b".to_string(),
        seed.branch.clone(),
        "--filter=blob:none".to_string(),
        "--no-checkout".to_string(),
        seed.repo.clone(),
        output_dir.to_string_lossy().to_string(),
    ]
}

fn checkout_args() -> Vec<String> {
    let mut args = vec!["checkout".to_string()];
    args.extend(CHECKOUT_FILES.iter().map(|f| f.to_string()));
    args
}

fn assume_unchanged_args(ids: &[String]) -> Vec<String> {
    let mut args = vec!["update-index".to_string(), "--assume-unchanged".to_string()];
    args.extend(ids.iter().map(|id| format!("{}.mp3", id)));
    args
}

async fn git(seed: &SeedConfig, cwd: Option<&Path>, args: &[String]) -> Result<()> {
    debug!("git {}", args.join(" "));

    let mut cmd = Command::new(&seed.git_path);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }

    let output = cmd
        .output()
        .await
        .with_context(|| format!("Failed to run {:?}", seed.git_path))?;
    if !output.status.success() {
        bail!(
            "git {} exited with {:?}: {}",
            args.first().map(String::as_str).unwrap_or_default(),
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// Replaces `output_dir` with a sparse checkout of the published branch.
pub async fn seed_output(seed: &SeedConfig, output_dir: &Path) -> Result<()> {
    info!("Seeding {:?} from {} ({})", output_dir, seed.repo, seed.branch);

    match tokio::fs::remove_dir_all(output_dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("Failed to clear {:?}", output_dir)),
    }

    git(seed, None, &clone_args(seed, output_dir)).await?;
    git(seed, Some(output_dir), &["reset".to_string(), "HEAD".to_string()]).await?;
    git(seed, Some(output_dir), &checkout_args()).await
}

/// Keeps already published files from showing up as deleted.
pub async fn assume_unchanged(seed: &SeedConfig, output_dir: &Path, done_ids: &[String]) -> Result<()> {
    for chunk in done_ids.chunks(UPDATE_INDEX_CHUNK) {
        git(seed, Some(output_dir), &assume_unchanged_args(chunk)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn seed() -> SeedConfig {
        SeedConfig {
            repo: "https://github.com/maple-pod/bgm.git".to_string(),
            branch: "gh-pages".to_string(),
            git_path: PathBuf::from("git"),
        }
    }

    #[test]
    fn test_clone_args() {
        let args = clone_args(&seed(), Path::new("dist"));
        assert_eq!(
            args,
            vec![
                "clone",
                "-b",
                "gh-pages",
                "--filter=blob:none",
                "--no-checkout",
                "https://github.com/maple-pod/bgm.git",
                "dist"
            ]
        );
    }

    #[test]
    fn test_checkout_restores_checkpoint_and_ignore_file() {
        assert_eq!(checkout_args(), vec!["checkout", "build.json", ".gitignore"]);
    }

    #[test]
    fn test_assume_unchanged_args() {
        let args = assume_unchanged_args(&["Bgm00/FloralLife".to_string()]);
        assert_eq!(
            args,
            vec!["update-index", "--assume-unchanged", "Bgm00/FloralLife.mp3"]
        );
    }

    #[tokio::test]
    async fn test_assume_unchanged_with_no_ids_runs_nothing() {
        let mut seed = seed();
        seed.git_path = PathBuf::from("/nonexistent/git");
        assume_unchanged(&seed, Path::new("."), &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_git_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut seed = seed();
        seed.git_path = PathBuf::from("/nonexistent/git");
        let result = seed_output(&seed, &dir.path().join("dist")).await;
        assert!(result.is_err());
    }
}
