use tokio_util::sync::CancellationToken;

use crate::pool::CompletionQueue;

use super::types::TaskReport;

/// What one call to [`Harvester::harvest`] produced.
pub(crate) struct HarvestOutcome<I, T> {
    pub(crate) succeeded: usize,
    pub(crate) failed: usize,
    pub(crate) reports: Vec<TaskReport<I, T>>,
    /// True when cancellation cut the drain short of the expected count.
    pub(crate) interrupted: bool,
}

/// Drains exactly the expected number of completions per cycle.
///
/// This is the engine's synchronization barrier: it turns an unordered
/// stream of asynchronous completions into a single deterministic resume
/// point for the control task, which continues exactly when the last
/// expected report has arrived, whichever sub-task that was.
pub(crate) struct Harvester<I, T> {
    completions: CompletionQueue<TaskReport<I, T>>,
    record: bool,
}

impl<I, T> Harvester<I, T> {
    pub(crate) fn new(completions: CompletionQueue<TaskReport<I, T>>, record: bool) -> Self {
        Self {
            completions,
            record,
        }
    }

    /// Pops `expected` reports, tallying them as they arrive.
    ///
    /// Cancellation while blocked returns the partial tally immediately
    /// with `interrupted` set; nothing already tallied is discarded.
    pub(crate) async fn harvest(
        &mut self,
        expected: usize,
        cancel: &CancellationToken,
    ) -> HarvestOutcome<I, T> {
        let mut outcome = HarvestOutcome {
            succeeded: 0,
            failed: 0,
            reports: Vec::new(),
            interrupted: false,
        };

        for _ in 0..expected {
            let report = tokio::select! {
                _ = cancel.cancelled() => {
                    outcome.interrupted = true;
                    break;
                }

                report = self.completions.pop() => match report {
                    Some(report) => report,
                    // Every push handle is gone; nothing more can arrive.
                    None => {
                        outcome.interrupted = true;
                        break;
                    }
                },
            };

            match &report.outcome {
                Ok(_) => outcome.succeeded += 1,
                Err(err) => {
                    outcome.failed += 1;
                    tracing::debug!(
                        cycle = report.cycle,
                        operation = %report.operation,
                        error = %err,
                        "sub-task failed"
                    );
                }
            }

            if self.record {
                outcome.reports.push(report);
            }
        }

        outcome
    }
}
