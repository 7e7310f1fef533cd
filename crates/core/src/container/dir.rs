//! Container backed by an unpacked archive on disk.
//!
//! Layout: `<root>/<entry>/<node>.<ext>`. Each entry directory is one image;
//! each regular file inside it is one sound node, named by its file stem.
//! Zero-length files are placeholders and extract as [`Extraction::NoData`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::error::ContainerError;
use super::traits::AssetContainer;
use super::types::{Extraction, SoundNode};

/// Directory-backed [`AssetContainer`].
#[derive(Debug, Clone)]
pub struct DirContainer {
    name: String,
    root: PathBuf,
}

impl DirContainer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.to_string_lossy().to_string());
        Self { name, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_root(&self) -> Result<(), ContainerError> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ContainerError::Malformed {
                container: self.name.clone(),
                reason: "expected an unpacked container directory".to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ContainerError::NotFound {
                path: self.root.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn entry_dir(&self, entry: &str) -> Result<PathBuf, ContainerError> {
        if entry.is_empty() || entry.contains(['/', '\\']) || entry == ".." {
            return Err(ContainerError::EntryNotFound {
                container: self.name.clone(),
                entry: entry.to_string(),
            });
        }
        Ok(self.root.join(entry))
    }

    /// Regular files directly under `dir`, sorted by name.
    async fn files_in(dir: &Path) -> Result<Vec<PathBuf>, ContainerError> {
        let mut files = Vec::new();
        let mut read_dir = fs::read_dir(dir).await?;
        while let Some(item) = read_dir.next_entry().await? {
            if item.file_type().await?.is_file() {
                files.push(item.path());
            }
        }
        files.sort();
        Ok(files)
    }

    async fn node_path(&self, node: &SoundNode) -> Result<Option<PathBuf>, ContainerError> {
        let dir = self.entry_dir(&node.entry)?;
        let files = match Self::files_in(&dir).await {
            Ok(files) => files,
            Err(ContainerError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ContainerError::EntryNotFound {
                    container: self.name.clone(),
                    entry: node.entry.clone(),
                })
            }
            Err(e) => return Err(e),
        };
        Ok(files
            .into_iter()
            .find(|p| p.file_stem().map(|s| s.to_string_lossy() == node.name.as_str()).unwrap_or(false)))
    }
}

#[async_trait]
impl AssetContainer for DirContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> Result<Vec<String>, ContainerError> {
        self.ensure_root().await?;

        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&self.root).await?;
        while let Some(item) = read_dir.next_entry().await? {
            if item.file_type().await?.is_dir() {
                entries.push(item.file_name().to_string_lossy().to_string());
            }
        }
        entries.sort();
        Ok(entries)
    }

    async fn sound_nodes(&self, entry: &str) -> Result<Vec<SoundNode>, ContainerError> {
        let dir = self.entry_dir(entry)?;
        if !fs::try_exists(&dir).await? {
            return Err(ContainerError::EntryNotFound {
                container: self.name.clone(),
                entry: entry.to_string(),
            });
        }

        Ok(Self::files_in(&dir)
            .await?
            .into_iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .map(|name| SoundNode {
                entry: entry.to_string(),
                name,
            })
            .collect())
    }

    async fn extract(&self, node: &SoundNode) -> Result<Extraction, ContainerError> {
        let Some(path) = self.node_path(node).await? else {
            return Ok(Extraction::NoData);
        };
        let bytes = fs::read(&path).await?;
        if bytes.is_empty() {
            Ok(Extraction::NoData)
        } else {
            Ok(Extraction::Audio(bytes))
        }
    }
}
