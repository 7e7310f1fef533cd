//! End-to-end build: registry, local extraction, remote acquisition.

mod build;

pub use build::{Build, BuildPipeline, RunReport};
