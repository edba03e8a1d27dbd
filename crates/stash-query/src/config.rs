//! Query engine configuration.

use crate::error::QueryError;

/// Where registered queries execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    /// On the caller's thread, inside `update()`.
    Inline,
    /// On a single background worker thread fed by a task queue.
    Worker,
}

/// Configuration for a [`QueryEngine`](crate::QueryEngine).
#[derive(Clone, Debug)]
pub struct QueryConfig {
    /// Execution mode. Default: [`ExecMode::Inline`].
    pub mode: ExecMode,
    /// Capacity of the worker task queue. Registrations and update cycles
    /// block once this many are queued. Ignored inline. Default: 64.
    pub queue_capacity: usize,
    /// Thread name for the worker. Default: `"stash-query"`.
    pub worker_name: String,
}

impl QueryConfig {
    /// Default task queue capacity.
    pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

    /// Default worker thread name.
    pub const DEFAULT_WORKER_NAME: &'static str = "stash-query";

    /// Config for inline execution.
    pub fn inline() -> Self {
        Self {
            mode: ExecMode::Inline,
            ..Self::default()
        }
    }

    /// Config for worker-thread execution with default queue settings.
    pub fn worker() -> Self {
        Self {
            mode: ExecMode::Worker,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.mode == ExecMode::Worker {
            if self.queue_capacity == 0 {
                return Err(QueryError::InvalidConfig {
                    reason: "queue_capacity must be at least 1".into(),
                });
            }
            if self.worker_name.is_empty() || self.worker_name.contains('\0') {
                return Err(QueryError::InvalidConfig {
                    reason: format!("worker_name {:?} is not a valid thread name", self.worker_name),
                });
            }
        }
        Ok(())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            mode: ExecMode::Inline,
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            worker_name: Self::DEFAULT_WORKER_NAME.to_string(),
        }
    }
}
