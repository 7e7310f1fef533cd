//! Checkpoint store: the waiting / in-flight / done state machine and its
//! durable snapshot.
//!
//! # Lifecycle
//!
//! ```text
//! Waiting ──mark_in_flight──▶ InFlight ──mark_done──▶ Done
//! ```
//!
//! Every id occupies exactly one set. Transitions and snapshots are serialized
//! behind a single mutex, so a snapshot never observes a half-applied move.
//! A flush writes the snapshot once; later flushes are no-ops, which lets the
//! termination hook and normal completion both call it safely.

mod error;
mod hook;
mod store;
mod types;

pub use error::CheckpointError;
pub use hook::{wait_for_signal, ExitFn, TerminationHook, TerminationReason};
pub use store::{CheckpointStore, FlushOutcome};
pub use types::{Checkpoint, Progress, ProgressCallback, TaskState, Transition};
