use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::pool::{CompletionQueue, WorkerPool};

use super::aggregate::Aggregator;
use super::config::Config;
use super::dispatch::Dispatcher;
use super::harvest::Harvester;
use super::operation::Operation;
use super::resolve::Resolve;
use super::source::BatchSource;
use super::types::{EngineState, RunSummary};

/// The cyclic batch engine.
///
/// Each cycle pulls one batch from the source, fans it out as one sub-task
/// per registered operation, drains exactly the expected number of
/// completions, and tallies the results. When the source is exhausted the
/// worker pool is drained gracefully.
///
/// Sub-tasks within a cycle complete in no particular order; the only
/// ordering guarantee is the cycle barrier: all of cycle K's results are
/// harvested before anything of cycle K+1 is submitted.
///
/// One `TaskGang` performs one run; [`TaskGang::run`] consumes it.
pub struct TaskGang<I, R, T> {
    config: Config,
    source: Box<dyn BatchSource<I>>,
    resolver: Arc<dyn Resolve<I, R>>,
    operations: Vec<Operation<R, T>>,
    state: EngineState,
}

impl<I, R, T> TaskGang<I, R, T>
where
    I: Send + Sync + 'static,
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    pub fn new(
        config: Config,
        source: impl BatchSource<I> + 'static,
        resolver: impl Resolve<I, R> + 'static,
    ) -> Self {
        Self {
            config,
            source: Box::new(source),
            resolver: Arc::new(resolver),
            operations: Vec::new(),
            state: EngineState::Idle,
        }
    }

    /// Registers an operation. The set is fixed once the run starts.
    pub fn register(&mut self, operation: Operation<R, T>) -> &mut Self {
        self.operations.push(operation);
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    fn transition(&mut self, next: EngineState) {
        tracing::debug!(from = ?self.state, to = ?next, "engine state transition");
        self.state = next;
    }

    /// Drives the full lifecycle and returns the final accounting.
    ///
    /// Never fails: every per-sub-task failure is recovered into a counted
    /// report, and cancelling `cancel` while the control task is blocked
    /// ends the run with a partial summary instead of an error.
    pub async fn run(mut self, cancel: &CancellationToken) -> RunSummary<I, T> {
        let operations: Arc<[Operation<R, T>]> = std::mem::take(&mut self.operations).into();
        if operations.is_empty() {
            tracing::warn!("no operations registered, every cycle will harvest zero results");
        }

        let mut aggregator = Aggregator::new();

        let mut batch = match self.source.next_batch().await {
            Some(batch) => batch,
            None => {
                // Zero-cycle run: no worker was ever needed.
                tracing::info!("input source exhausted before the first cycle");
                self.transition(EngineState::Terminated);
                return aggregator.finish(false);
            }
        };

        let mut pool = WorkerPool::new(Arc::new(self.config.pool.clone()));
        let (completion_handle, completion_queue) = CompletionQueue::channel();
        let dispatcher = Dispatcher::new(Arc::clone(&self.resolver), operations);
        let mut harvester = Harvester::new(completion_queue, self.config.record_reports);
        let mut cycle: u64 = 0;

        loop {
            cycle += 1;
            self.transition(EngineState::Running);
            let expected = dispatcher
                .dispatch(&pool, &completion_handle, batch, cycle)
                .await;
            tracing::debug!(cycle, expected, "batch dispatched");

            self.transition(EngineState::Harvesting);
            let outcome = harvester.harvest(expected, cancel).await;
            let interrupted = outcome.interrupted;
            tracing::info!(
                cycle,
                expected,
                succeeded = outcome.succeeded,
                failed = outcome.failed,
                "cycle harvested"
            );
            aggregator.record_cycle(cycle, expected, outcome);

            if interrupted {
                tracing::warn!(cycle, "interrupted while harvesting, reporting partial tallies");
                self.transition(EngineState::Terminated);
                return aggregator.finish(true);
            }

            match self.source.next_batch().await {
                Some(next) => batch = next,
                None => break,
            }
        }

        self.transition(EngineState::Draining);
        let drained = drain(&mut pool, cancel).await;
        self.transition(EngineState::Terminated);

        let summary = aggregator.finish(!drained);
        tracing::info!(
            cycles = summary.cycles.len(),
            succeeded = summary.succeeded,
            failed = summary.failed,
            interrupted = summary.interrupted,
            "run terminated"
        );
        summary
    }
}

/// Graceful pool drain raced against cancellation.
///
/// Returns false when the wait was interrupted; the workers are left to
/// wind down on their own in that case.
async fn drain(pool: &mut WorkerPool, cancel: &CancellationToken) -> bool {
    tokio::select! {
        result = pool.shutdown(true) => {
            if let Err(err) = result {
                tracing::warn!(error = %err, "graceful shutdown ended abnormally");
            }
            true
        }

        _ = cancel.cancelled() => {
            tracing::warn!("interrupted while draining the worker pool");
            false
        }
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
