use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::config::EngineConfig;
use super::types::{EngineReport, TaskFailure};
use crate::resolver::{ResolveError, SourceResolver};
use crate::task::TaskId;

/// Drains waiting ids through remote acquisition with bounded concurrency.
#[derive(Clone)]
pub struct ExecutionEngine {
    resolver: SourceResolver,
    concurrency: usize,
}

impl ExecutionEngine {
    /// A concurrency of 0 is treated as 1.
    pub fn new(resolver: SourceResolver, config: &EngineConfig) -> Self {
        Self {
            resolver,
            concurrency: config.concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every id to completion or failure and returns once all have settled.
    pub async fn run(&self, ids: Vec<TaskId>) -> EngineReport {
        if ids.is_empty() {
            return EngineReport::default();
        }

        info!(
            "Acquiring {} tasks remotely (concurrency {})",
            ids.len(),
            self.concurrency
        );

        let outcomes: Vec<(TaskId, Result<(), ResolveError>)> = stream::iter(ids)
            .map(|id| self.run_one(id))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = EngineReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.completed.push(id),
                Err(e) => report.failed.push(TaskFailure {
                    id,
                    stage: e.stage().to_string(),
                    error: e.to_string(),
                }),
            }
        }

        info!(
            "Remote acquisition finished: {} done, {} failed",
            report.completed.len(),
            report.failed.len()
        );
        report
    }

    async fn run_one(&self, id: TaskId) -> (TaskId, Result<(), ResolveError>) {
        let result = self.resolver.acquire_remote(&id).await;
        if let Err(e) = &result {
            warn!("Failed to acquire {} ({}): {}", id, e.stage(), e);
        }
        (id, result)
    }
}
