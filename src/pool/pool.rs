use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::Config;
use super::types::{Backpressure, PoolError};

/// A unit of work submitted to the pool.
type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A fixed-size pool of worker tasks executing submitted jobs
/// concurrently, decoupled from the submitting control task.
///
/// Jobs flow through a single bounded queue shared by all workers; the
/// pool owns no business logic, so whatever a job needs it must capture
/// itself.
pub struct WorkerPool {
    config: Arc<Config>,
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    abort: CancellationToken,
}

impl WorkerPool {
    /// Spawns `worker_num` workers listening on the shared work queue.
    pub fn new(config: Arc<Config>) -> Self {
        let capacity = config.queue_capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let abort = CancellationToken::new();

        let mut workers = Vec::with_capacity(config.worker_num);
        for worker_id in 0..config.worker_num {
            let receiver = Arc::clone(&receiver);
            let abort = abort.clone();

            workers.push(tokio::spawn(async move {
                Self::worker(worker_id, receiver, abort).await;
            }));
        }

        Self {
            config,
            sender: Some(sender),
            workers,
            abort,
        }
    }

    /// Enqueues a job for execution.
    ///
    /// Under [`Backpressure::Block`] this waits for queue space; under
    /// [`Backpressure::Reject`] a full queue fails fast with
    /// [`PoolError::Saturated`]. A job is never silently dropped.
    pub async fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(PoolError::Closed)?;
        let job: Job = Box::pin(job);

        match self.config.backpressure {
            Backpressure::Block => sender.send(job).await.map_err(|_| PoolError::Closed),
            Backpressure::Reject => sender.try_send(job).map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => PoolError::Saturated,
                mpsc::error::TrySendError::Closed(_) => PoolError::Closed,
            }),
        }
    }

    /// Stops accepting submissions and shuts the workers down.
    ///
    /// A graceful shutdown lets the workers drain the queue and finish
    /// in-flight jobs before returning; the wait is unbounded unless
    /// `shutdown_timeout` is configured, in which case the remaining
    /// workers are aborted once the deadline passes. A non-graceful
    /// shutdown stops each worker after its current job without draining
    /// the queue. Calling shutdown on an already shut down pool is a
    /// no-op.
    pub async fn shutdown(&mut self, graceful: bool) -> Result<(), PoolError> {
        // Closing the intake is what lets idle workers observe the end of
        // the queue.
        drop(self.sender.take());

        if self.workers.is_empty() {
            return Ok(());
        }

        if !graceful {
            self.abort.cancel();
        }

        let workers = std::mem::take(&mut self.workers);
        let join_all = async {
            for (worker_id, handle) in workers.into_iter().enumerate() {
                if let Err(err) = handle.await {
                    tracing::warn!(worker_id, error = %err, "worker terminated abnormally");
                }
            }
        };

        match self.config.shutdown_timeout {
            Some(deadline) if graceful => {
                if tokio::time::timeout(deadline, join_all).await.is_err() {
                    tracing::warn!(
                        deadline_ms = deadline.as_millis() as u64,
                        "graceful shutdown deadline exceeded, aborting workers"
                    );
                    self.abort.cancel();
                    return Err(PoolError::ShutdownTimeout);
                }
                Ok(())
            }
            _ => {
                join_all.await;
                Ok(())
            }
        }
    }

    async fn worker(
        worker_id: usize,
        receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
        abort: CancellationToken,
    ) {
        tracing::debug!(worker_id, "worker started");

        loop {
            let job = tokio::select! {
                // Once aborted, never take another job.
                biased;

                _ = abort.cancelled() => {
                    tracing::debug!(worker_id, "worker aborted");
                    return;
                }

                job = async {
                    let mut receiver = receiver.lock().await;
                    receiver.recv().await
                } => job,
            };

            match job {
                Some(job) => job.await,
                None => {
                    tracing::debug!(worker_id, "work queue drained, worker exiting");
                    return;
                }
            }
        }
    }
}
