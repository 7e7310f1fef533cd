//! Moving finished files into the output tree.

use std::path::{Path, PathBuf};
use tokio::fs;

/// Attempts to move a file atomically (rename).
async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(true),
        Err(e) => {
            // Cross-filesystem moves fail with EXDEV (18 on Linux)
            if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                Ok(false)
            } else {
                Err(e)
            }
        }
    }
}

fn sibling_temp(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".incoming");
    destination.with_file_name(name)
}

/// Moves `source` to `destination`, creating parent directories.
///
/// Falls back to copy-then-rename across filesystems, so the destination
/// never holds a partial file.
pub(crate) async fn place_file(source: &Path, destination: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }

    if try_atomic_move(source, destination).await? {
        return Ok(());
    }

    let tmp = sibling_temp(destination);
    fs::copy(source, &tmp).await?;
    fs::rename(&tmp, destination).await?;
    fs::remove_file(source).await?;
    Ok(())
}

/// Writes `bytes` to `destination` through a sibling temp file.
pub(crate) async fn write_file(destination: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = sibling_temp(destination);
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, destination).await
}
