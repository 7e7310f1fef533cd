use std::fmt;

/// Outcome of extracting a sound node.
///
/// Some nodes are placeholders with no audio; that is `NoData`, not an error.
#[derive(Clone, PartialEq, Eq)]
pub enum Extraction {
    Audio(Vec<u8>),
    NoData,
}

impl fmt::Debug for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extraction::Audio(bytes) => write!(f, "Audio({} bytes)", bytes.len()),
            Extraction::NoData => write!(f, "NoData"),
        }
    }
}

/// A sound node located inside a container entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundNode {
    /// Entry (image) name, e.g. `Bgm00.img`.
    pub entry: String,
    /// Node name within the entry, e.g. `FloralLife`.
    pub name: String,
}

/// Task group for an entry name: the name without its `.img` suffix.
pub fn entry_group(entry: &str) -> &str {
    entry.strip_suffix(".img").unwrap_or(entry)
}
