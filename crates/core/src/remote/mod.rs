//! Remote video sources.
//!
//! A task's remote id is turned into a [`RemoteLocator`]; a [`RemoteSource`]
//! downloads the best available audio stream for it into a staging file,
//! which the converter then transcodes.

mod error;
mod locator;
mod traits;
mod ytdlp;

pub use error::RemoteError;
pub use locator::RemoteLocator;
pub use traits::RemoteSource;
pub use ytdlp::YtDlpSource;
