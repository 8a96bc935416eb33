// src/pool/config.rs

use derive_builder::Builder;
use std::time::Duration;

use super::types::Backpressure;

#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct Config {
    /// Number of concurrent worker tasks executing submitted jobs
    #[builder(default = "num_cpus::get()")]
    pub(crate) worker_num: usize,

    /// Capacity of the bounded work queue feeding the workers
    #[builder(default = "256")]
    pub(crate) queue_capacity: usize,

    /// Policy applied when the work queue is full
    #[builder(default = "Backpressure::Block")]
    pub(crate) backpressure: Backpressure,

    /// Deadline for graceful shutdown; `None` waits indefinitely
    #[builder(default)]
    pub(crate) shutdown_timeout: Option<Duration>,
}

impl Config {
    /// Returns the number of worker tasks
    #[inline]
    pub fn worker_num(&self) -> usize {
        self.worker_num
    }

    /// Returns the work queue capacity
    #[inline]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Returns the backpressure policy for a full work queue
    #[inline]
    pub fn backpressure(&self) -> Backpressure {
        self.backpressure
    }

    /// Returns the graceful shutdown deadline, if one is configured
    #[inline]
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            worker_num: num_cpus::get(),
            queue_capacity: 256,
            backpressure: Backpressure::Block,
            shutdown_timeout: None,
        }
    }
}
