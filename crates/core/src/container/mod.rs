//! Local asset containers.
//!
//! A container is a read-only archive of named entries (images). Entries whose
//! name starts with a sound category prefix hold a tree of named sound nodes,
//! each of which lazily yields its raw audio payload. The archive's binary
//! format is not parsed here; implementations of [`AssetContainer`] adapt a
//! concrete store to this shape.

mod dir;
mod error;
mod traits;
mod types;

pub use dir::DirContainer;
pub use error::ContainerError;
pub use traits::AssetContainer;
pub use types::{entry_group, Extraction, SoundNode};
