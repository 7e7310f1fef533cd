//! Testing utilities and mock implementations.
//!
//! Mocks for every external collaborator of the resolver, so whole builds can
//! run against a temp directory without ffmpeg, yt-dlp or game data.
//!
//! # Example
//!
//! ```rust,ignore
//! use bgmbuild_core::testing::{MockContainer, MockRemoteSource, MockTagWriter, MockTranscoder};
//!
//! let container = MockContainer::new("Sound.wz");
//! container.add_sound("Bgm00.img", "FloralLife", b"audio".to_vec()).await;
//!
//! let remote = MockRemoteSource::new();
//! remote.fail_on("broken-id").await;
//! ```

mod mock_container;
mod mock_converter;
mod mock_remote;

pub use mock_container::MockContainer;
pub use mock_converter::{MockTagWriter, MockTranscoder};
pub use mock_remote::MockRemoteSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::sync::Arc;

    use super::{MockContainer, MockRemoteSource, MockTagWriter, MockTranscoder};
    use crate::resolver::Collaborators;
    use crate::task::{EntryMetadata, EntrySource, ManifestEntry, Task};

    /// A manifest entry with a remote id and plausible metadata.
    pub fn manifest_entry(group: &str, name: &str, remote_id: &str) -> ManifestEntry {
        ManifestEntry {
            description: format!("{} description", name),
            filename: name.to_string(),
            mark: "MapleStory".to_string(),
            metadata: EntryMetadata {
                album_artist: Some("Wizet".to_string()),
                artist: format!("{} Artist", group),
                title: format!("{} Title", name),
                year: "2004".to_string(),
                title_alt: None,
            },
            source: EntrySource {
                client: Some("GMS".to_string()),
                date: None,
                structure: group.to_string(),
                version: None,
            },
            youtube: remote_id.to_string(),
        }
    }

    /// A task as the registry would build it for `output_dir`.
    pub fn task(group: &str, name: &str, remote_id: &str, output_dir: &Path) -> Task {
        let entries = [manifest_entry(group, name, remote_id)];
        let registry = crate::task::build_registry(&entries, None, output_dir);
        let id = crate::task::task_id(group, name);
        registry
            .index
            .get(&id)
            .cloned()
            .unwrap_or_else(|| panic!("fixture entry {} is not eligible", id))
    }

    /// One instance of every mock, wired for a resolver.
    #[derive(Clone, Default)]
    pub struct MockSet {
        pub container: MockContainer,
        pub remote: MockRemoteSource,
        pub transcoder: MockTranscoder,
        pub tagger: MockTagWriter,
    }

    impl MockSet {
        pub fn new() -> Self {
            Self {
                container: MockContainer::new("Sound.wz"),
                ..Default::default()
            }
        }

        pub fn collaborators(&self) -> Collaborators {
            Collaborators {
                containers: vec![Arc::new(self.container.clone())],
                remote: Arc::new(self.remote.clone()),
                transcoder: Arc::new(self.transcoder.clone()),
                tagger: Arc::new(self.tagger.clone()),
            }
        }
    }
}
