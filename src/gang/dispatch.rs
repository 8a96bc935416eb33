use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::pool::{CompletionHandle, WorkerPool};

use super::operation::Operation;
use super::resolve::Resolve;
use super::types::{TaskError, TaskReport};

/// Expands one batch into `|batch| * |operations|` sub-tasks and submits
/// them to the worker pool, wiring each completion into the queue.
///
/// The dispatcher never reads a result back; it only guarantees that every
/// sub-task it accounts for will eventually push exactly one report.
pub(crate) struct Dispatcher<I, R, T> {
    resolver: Arc<dyn Resolve<I, R>>,
    operations: Arc<[Operation<R, T>]>,
}

impl<I, R, T> Dispatcher<I, R, T>
where
    I: Send + Sync + 'static,
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    pub(crate) fn new(
        resolver: Arc<dyn Resolve<I, R>>,
        operations: Arc<[Operation<R, T>]>,
    ) -> Self {
        Self {
            resolver,
            operations,
        }
    }

    /// Submits every sub-task of the batch, item-major, and returns the
    /// exact number of reports the harvester must subsequently drain.
    ///
    /// A submission the pool refuses still produces a report (pushed here
    /// as a recovered failure), so the returned count always equals
    /// `|batch| * |operations|`.
    pub(crate) async fn dispatch(
        &self,
        pool: &WorkerPool,
        completions: &CompletionHandle<TaskReport<I, T>>,
        batch: Vec<I>,
        cycle: u64,
    ) -> usize {
        let mut submitted = 0;

        for item in batch {
            let item = Arc::new(item);

            // One resolution per item, shared by all of its sub-tasks. The
            // first sub-task polled drives it; the rest await the cloned
            // outcome.
            let resolution = {
                let resolver = Arc::clone(&self.resolver);
                let item = Arc::clone(&item);
                async move {
                    match AssertUnwindSafe(resolver.resolve(&item)).catch_unwind().await {
                        Ok(Ok(resource)) => Ok(Arc::new(resource)),
                        Ok(Err(err)) => Err(TaskError::Resolve(err.to_string())),
                        Err(_) => Err(TaskError::Resolve("resolver panicked".to_string())),
                    }
                }
                .boxed()
                .shared()
            };

            for operation in self.operations.iter() {
                let name = operation.name().to_string();
                let report_item = Arc::clone(&item);

                let sub_task = {
                    let operation = operation.clone();
                    let item = Arc::clone(&item);
                    let resolution = resolution.clone();
                    let completions = completions.clone();

                    async move {
                        let outcome = match resolution.await {
                            Ok(resource) => operation.apply(&resource).await,
                            Err(err) => Err(err),
                        };

                        completions.push(TaskReport {
                            item,
                            operation: operation.name().to_string(),
                            cycle,
                            outcome,
                        });
                    }
                };

                submitted += 1;
                if let Err(err) = pool.submit(sub_task).await {
                    tracing::warn!(
                        cycle,
                        operation = %name,
                        error = %err,
                        "sub-task submission refused, recording failure"
                    );
                    completions.push(TaskReport {
                        item: report_item,
                        operation: name,
                        cycle,
                        outcome: Err(TaskError::Rejected),
                    });
                }
            }
        }

        submitted
    }
}
