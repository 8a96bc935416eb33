//! # taskgang-rust
//!
//! A cyclic batch task-gang engine built on Tokio.
//!
//! The engine repeatedly pulls a batch of work items from a source,
//! expands each item into one sub-task per registered operation, submits
//! the whole fan-out to a shared worker pool, then blocks until exactly
//! the expected number of results has drained from a completion queue
//! before moving to the next batch. When the source runs dry the pool is
//! drained gracefully and a final tally is reported.
//!
//! ## Features
//!
//! - **Fan-out dispatch**: every (item, operation) pairing becomes an
//!   independently scheduled sub-task
//! - **Out-of-order harvesting**: completions are consumed as they arrive,
//!   never in submission order
//! - **Per-cycle barrier**: a batch is fully harvested before the next one
//!   is submitted
//! - **Total accounting**: failures are recovered into counted reports, so
//!   `succeeded + failed` always equals the fan-out size
//! - **Graceful cancellation** via `CancellationToken`, yielding partial
//!   tallies instead of errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taskgang_rust::gang::{Config, Operation, TaskGang};
//! use tokio_util::sync::CancellationToken;
//!
//! let batches = vec![vec!["a", "b"], vec!["c"]];
//! let mut gang = TaskGang::new(Config::default(), batches.into_iter(), resolver);
//! gang.register(Operation::new("thumbnail", thumbnail));
//! gang.register(Operation::new("grayscale", grayscale));
//!
//! let summary = gang.run(&CancellationToken::new()).await;
//! println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//! ```
//!
//! ## Modules
//!
//! - [`pool`] - worker pool and completion queue
//! - [`gang`] - operations, batch sources, and the cycle engine

pub mod gang;
pub mod pool;
