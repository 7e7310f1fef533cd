//! Mock asset container for testing.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::container::{AssetContainer, ContainerError, Extraction, SoundNode};

/// In-memory [`AssetContainer`].
///
/// Entries and nodes are kept sorted so scans are deterministic.
#[derive(Debug, Clone)]
pub struct MockContainer {
    name: String,
    entries: Arc<RwLock<BTreeMap<String, BTreeMap<String, Vec<u8>>>>>,
    failing: Arc<RwLock<HashSet<(String, String)>>>,
    extracted: Arc<RwLock<Vec<SoundNode>>>,
}

impl Default for MockContainer {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Arc::default(),
            failing: Arc::default(),
            extracted: Arc::default(),
        }
    }

    /// Adds a sound node. Empty `audio` models a node without data.
    pub async fn add_sound(&self, entry: &str, name: &str, audio: impl Into<Vec<u8>>) {
        self.entries
            .write()
            .await
            .entry(entry.to_string())
            .or_default()
            .insert(name.to_string(), audio.into());
    }

    /// Makes extraction of one node fail with a malformed-container error.
    pub async fn fail_extract(&self, entry: &str, name: &str) {
        self.failing
            .write()
            .await
            .insert((entry.to_string(), name.to_string()));
    }

    /// Nodes extracted so far, in call order.
    pub async fn extracted(&self) -> Vec<SoundNode> {
        self.extracted.read().await.clone()
    }
}

#[async_trait]
impl AssetContainer for MockContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> Result<Vec<String>, ContainerError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn sound_nodes(&self, entry: &str) -> Result<Vec<SoundNode>, ContainerError> {
        let entries = self.entries.read().await;
        let nodes = entries.get(entry).ok_or_else(|| ContainerError::EntryNotFound {
            container: self.name.clone(),
            entry: entry.to_string(),
        })?;
        Ok(nodes
            .keys()
            .map(|name| SoundNode {
                entry: entry.to_string(),
                name: name.clone(),
            })
            .collect())
    }

    async fn extract(&self, node: &SoundNode) -> Result<Extraction, ContainerError> {
        self.extracted.write().await.push(node.clone());

        if self
            .failing
            .read()
            .await
            .contains(&(node.entry.clone(), node.name.clone()))
        {
            return Err(ContainerError::Malformed {
                container: self.name.clone(),
                reason: format!("corrupt node {}", node.name),
            });
        }

        let entries = self.entries.read().await;
        match entries.get(&node.entry).and_then(|nodes| nodes.get(&node.name)) {
            Some(audio) if !audio.is_empty() => Ok(Extraction::Audio(audio.clone())),
            _ => Ok(Extraction::NoData),
        }
    }
}
