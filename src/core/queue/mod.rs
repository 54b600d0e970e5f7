//! Bounded worker pool for export tasks
//!
//! Tasks are registered in a [`TaskRegistry`] and their ids are sent over a
//! FIFO channel. A fixed number of workers take turns receiving from the
//! channel; each id is received by exactly one worker, which owns the task
//! until it reaches a terminal state.
//!
//! Shutdown is cooperative: [`TaskQueue::stop`] raises a stop signal that
//! every worker checks before receiving, ahead of any queued task. A worker
//! busy exporting sees it once that export returns.

pub mod pool;
pub mod registry;

pub use pool::{QueueStats, TaskQueue};
pub use registry::{StatusCounts, TaskRegistry};

use crate::config::ExportConfig;
use std::time::Duration;

/// Worker pool tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    /// Number of concurrent workers
    pub workers: usize,
    /// How long a worker waits for a message before housekeeping
    pub queue_timeout: Duration,
    /// Bound on joining workers during stop
    pub shutdown_timeout: Duration,
    /// How long terminal tasks stay queryable
    pub task_retention: Duration,
}

impl QueueSettings {
    /// Settings derived from the export configuration
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            workers: config.max_workers.max(1),
            queue_timeout: Duration::from_millis(config.queue_timeout_ms),
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
            task_retention: Duration::from_secs(config.task_retention_secs),
        }
    }

    /// Override the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}
