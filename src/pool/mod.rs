pub mod completion;
pub mod config;
pub mod pool;
pub mod types;

pub use completion::{CompletionHandle, CompletionQueue};
pub use config::{Config, ConfigBuilder};
pub use pool::WorkerPool;
pub use types::{Backpressure, PoolError};
