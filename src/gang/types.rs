use std::sync::Arc;

use thiserror::Error;

/// Failure of a single sub-task, recovered at the sub-task boundary and
/// recorded in its [`TaskReport`] instead of escaping to the worker.
///
/// Cloneable because a resolution failure is shared by every operation
/// scheduled against the same work item.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Resolving the work item into an operation input failed.
    #[error("resolving work item failed: {0}")]
    Resolve(String),

    /// The operation returned an error for the resolved input.
    #[error("operation '{operation}' failed: {message}")]
    Operation { operation: String, message: String },

    /// The operation panicked; the panic was contained at the sub-task
    /// boundary.
    #[error("operation '{operation}' panicked")]
    Panicked { operation: String },

    /// The worker pool refused the submission under the reject
    /// backpressure policy.
    #[error("worker pool rejected the sub-task")]
    Rejected,
}

/// The outcome of one (work item, operation) sub-task.
///
/// Created once when the sub-task finishes, pushed into the completion
/// queue, and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TaskReport<I, T> {
    /// The work item the sub-task was derived from.
    pub item: Arc<I>,
    /// Name of the operation applied to the resolved item.
    pub operation: String,
    /// Cycle the sub-task was dispatched in (starts at 1).
    pub cycle: u64,
    /// Payload on success, recovered failure otherwise.
    pub outcome: Result<T, TaskError>,
}

impl<I, T> TaskReport<I, T> {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Tally for one harvested cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleTally {
    pub cycle: u64,
    /// Expected number of results, `|batch| * |operations|`.
    pub expected: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// False when cancellation cut the harvest short of `expected`.
    pub complete: bool,
}

/// Final accounting for one engine run.
#[derive(Debug)]
pub struct RunSummary<I, T> {
    /// One tally per cycle, in cycle order.
    pub cycles: Vec<CycleTally>,
    pub succeeded: usize,
    pub failed: usize,
    /// True when the run ended early on cancellation; the tallies up to
    /// that point are still reported.
    pub interrupted: bool,
    /// Individual reports, retained only when report recording is enabled.
    pub reports: Vec<TaskReport<I, T>>,
}

impl<I, T> RunSummary<I, T> {
    /// Total number of harvested results across all cycles.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Lifecycle states of the engine control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Harvesting,
    Draining,
    Terminated,
}
