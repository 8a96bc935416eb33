pub mod config;
pub mod controller;
pub mod operation;
pub mod resolve;
pub mod source;
pub mod types;

mod aggregate;
mod dispatch;
mod harvest;

pub use config::{Config, ConfigBuilder};
pub use controller::TaskGang;
pub use operation::{Operation, Transform};
pub use resolve::Resolve;
pub use source::BatchSource;
pub use types::{CycleTally, EngineState, RunSummary, TaskError, TaskReport};

#[cfg(test)]
mod tests;
