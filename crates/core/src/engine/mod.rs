//! Bounded-concurrency execution of remote acquisitions.
//!
//! The engine drains a list of waiting ids through
//! [`SourceResolver::acquire_remote`](crate::resolver::SourceResolver::acquire_remote),
//! keeping at most `concurrency` acquisitions outstanding and starting the next
//! id as soon as any slot frees up. Failures are collected per task; they never
//! stop the queue.

mod config;
mod runner;
mod types;

pub use config::EngineConfig;
pub use runner::ExecutionEngine;
pub use types::{EngineReport, TaskFailure};
