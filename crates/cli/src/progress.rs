//! Progress reporting.

use std::sync::Arc;
use tracing::{debug, info};

use bgmbuild_core::{ProgressCallback, TaskState, Transition};

/// Logs the set sizes after every transition.
pub fn reporter() -> ProgressCallback {
    Arc::new(|transition: &Transition| match transition.state {
        TaskState::Done => info!("{} finished {}", transition.progress, transition.id),
        TaskState::InFlight => info!("{} started {}", transition.progress, transition.id),
        TaskState::Waiting => debug!("{} requeued {}", transition.progress, transition.id),
    })
}
