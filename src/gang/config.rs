use derive_builder::Builder;

use crate::pool;

/// Configuration for one engine run, threaded through construction.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct Config {
    /// Worker pool sizing and policies
    #[builder(default)]
    pub(crate) pool: pool::Config,

    /// Retain individual task reports in the run summary for diagnostics
    #[builder(default = "false")]
    pub(crate) record_reports: bool,
}

impl Config {
    /// Returns the worker pool configuration
    #[inline]
    pub fn pool(&self) -> &pool::Config {
        &self.pool
    }

    /// Returns whether individual reports are retained
    #[inline]
    pub fn record_reports(&self) -> bool {
        self.record_reports
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pool: pool::Config::default(),
            record_reports: false,
        }
    }
}
