use thiserror::Error;

/// Errors surfaced by the worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool no longer accepts submissions.
    #[error("worker pool is shut down")]
    Closed,

    /// The work queue is full under [`Backpressure::Reject`].
    #[error("work queue is saturated")]
    Saturated,

    /// Graceful shutdown exceeded the configured deadline and the
    /// remaining workers were aborted.
    #[error("graceful shutdown timed out")]
    ShutdownTimeout,
}

/// Policy applied when the bounded work queue is full.
///
/// A full queue never drops a submission silently: it either delays the
/// submitter or reports the refusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// `submit` waits until queue space frees up.
    Block,
    /// `submit` fails fast with [`PoolError::Saturated`].
    Reject,
}
