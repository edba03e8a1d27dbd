//! Query engine error types.

use std::error::Error;
use std::fmt;

/// Errors from registering, running, or collecting queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// The query was dropped before producing a result: the engine shut
    /// down first, or the query panicked on the worker thread.
    Abandoned,
    /// No result arrived within the requested timeout.
    Timeout,
    /// The engine has been shut down.
    ShuttingDown,
    /// `update()` was called before any snapshot was set.
    NoData,
    /// The worker thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of the spawn failure.
        reason: String,
    },
    /// A [`QueryConfig`](crate::QueryConfig) invariant was violated.
    InvalidConfig {
        /// Description of which invariant was violated.
        reason: String,
    },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abandoned => write!(f, "query abandoned before producing a result"),
            Self::Timeout => write!(f, "timed out waiting for query result"),
            Self::ShuttingDown => write!(f, "query engine is shut down"),
            Self::NoData => write!(f, "no snapshot set"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "failed to spawn query worker: {reason}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid query config: {reason}"),
        }
    }
}

impl Error for QueryError {}
