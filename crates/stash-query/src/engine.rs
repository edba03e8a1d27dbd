//! The query engine: snapshot ownership, registration and update cycles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

use crate::config::{ExecMode, QueryConfig};
use crate::error::QueryError;
use crate::job::{self, run_all, Job};
use crate::ticket::{QueryStream, QueryTicket};
use crate::worker::{worker_loop, WorkerTask};

enum Backend<C> {
    Inline {
        jobs: Vec<Job<C>>,
    },
    Worker {
        tasks: Sender<WorkerTask<C>>,
        thread: JoinHandle<()>,
    },
    Stopped,
}

/// Runs read-only queries against a snapshot of `C`.
///
/// The engine holds the snapshot behind an `Arc`; queries only ever see
/// `&C`. Each [`update`](Self::update) runs every registered query once
/// against the current snapshot. One-shot queries
/// ([`register`](Self::register)) then retire; standing queries
/// ([`subscribe`](Self::subscribe)) stay until their stream is dropped.
///
/// In [`ExecMode::Worker`] the queries run on a single background thread in
/// the order they were registered and updated. Dropping the engine closes
/// the task queue and joins the worker; queries that never ran report
/// [`QueryError::Abandoned`].
///
/// # Example
///
/// ```
/// use stash_query::QueryEngine;
///
/// let mut engine = QueryEngine::inline();
/// engine.set_data((1..=10).collect::<Vec<i32>>());
/// let evens = engine.register(|data: &Vec<i32>| {
///     data.iter().copied().filter(|v| v % 2 == 0).collect::<Vec<_>>()
/// });
/// engine.update().unwrap();
/// assert_eq!(evens.wait().unwrap(), vec![2, 4, 6, 8, 10]);
/// ```
pub struct QueryEngine<C> {
    data: Option<Arc<C>>,
    backend: Backend<C>,
    mode: ExecMode,
    /// Registered jobs not yet retired (shared with the worker).
    pending: Arc<AtomicUsize>,
}

impl<C> QueryEngine<C>
where
    C: Send + Sync + 'static,
{
    /// Create an engine from a validated config.
    ///
    /// In worker mode this spawns the worker thread.
    pub fn new(config: QueryConfig) -> Result<Self, QueryError> {
        config.validate()?;
        let pending = Arc::new(AtomicUsize::new(0));

        let backend = match config.mode {
            ExecMode::Inline => Backend::Inline { jobs: Vec::new() },
            ExecMode::Worker => {
                let (tasks, task_rx) = crossbeam_channel::bounded(config.queue_capacity);
                let worker_pending = Arc::clone(&pending);
                let thread = thread::Builder::new()
                    .name(config.worker_name.clone())
                    .spawn(move || worker_loop(task_rx, worker_pending))
                    .map_err(|e| QueryError::ThreadSpawnFailed {
                        reason: e.to_string(),
                    })?;
                tracing::debug!(
                    worker = %config.worker_name,
                    queue_capacity = config.queue_capacity,
                    "query worker started"
                );
                Backend::Worker { tasks, thread }
            }
        };

        Ok(Self {
            data: None,
            backend,
            mode: config.mode,
            pending,
        })
    }

    /// Create an inline engine.
    pub fn inline() -> Self {
        Self {
            data: None,
            backend: Backend::Inline { jobs: Vec::new() },
            mode: ExecMode::Inline,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the snapshot with `data`.
    ///
    /// Queries already dispatched to the worker keep the snapshot they
    /// were dispatched with.
    pub fn set_data(&mut self, data: C) {
        self.data = Some(Arc::new(data));
    }

    /// Replace the snapshot with an already shared one.
    pub fn set_shared(&mut self, data: Arc<C>) {
        self.data = Some(data);
    }

    /// The current snapshot, if one has been set.
    pub fn data(&self) -> Option<&Arc<C>> {
        self.data.as_ref()
    }

    /// Execution mode this engine was built with.
    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    /// Number of registered queries that have not retired yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Register a one-shot query. It runs on the next update cycle.
    pub fn register<R, F>(&mut self, query: F) -> QueryTicket<R>
    where
        R: Send + 'static,
        F: FnOnce(&C) -> R + Send + 'static,
    {
        let (job, ticket) = job::once(query);
        self.submit(job);
        ticket
    }

    /// Register a standing query. It runs on every update cycle until the
    /// returned stream is dropped.
    pub fn subscribe<R, F>(&mut self, query: F) -> QueryStream<R>
    where
        R: Send + 'static,
        F: FnMut(&C) -> R + Send + 'static,
    {
        let (job, stream) = job::standing(query);
        self.submit(job);
        stream
    }

    fn submit(&mut self, job: Job<C>) {
        match &mut self.backend {
            Backend::Inline { jobs } => {
                jobs.push(job);
                self.pending.fetch_add(1, Ordering::AcqRel);
            }
            Backend::Worker { tasks, .. } => {
                // Count before sending so the worker's decrement cannot underflow.
                self.pending.fetch_add(1, Ordering::AcqRel);
                if tasks.send(WorkerTask::Register(job)).is_err() {
                    self.pending.fetch_sub(1, Ordering::AcqRel);
                    tracing::warn!("query worker gone; dropping registration");
                }
            }
            // Job drops here; its ticket reports Abandoned.
            Backend::Stopped => {}
        }
    }

    /// Run one update cycle against the current snapshot.
    ///
    /// Inline, queries run before this returns (and a panicking query
    /// unwinds into the caller). In worker mode the cycle is queued; this
    /// blocks only if the task queue is full. Use [`sync`](Self::sync) to
    /// wait for completion.
    pub fn update(&mut self) -> Result<(), QueryError> {
        if matches!(self.backend, Backend::Stopped) {
            return Err(QueryError::ShuttingDown);
        }
        let data = self.data.clone().ok_or(QueryError::NoData)?;
        match &mut self.backend {
            Backend::Inline { jobs } => {
                let retired = run_all(jobs, &*data, &self.pending);
                tracing::trace!(retired, remaining = jobs.len(), "query cycle");
                Ok(())
            }
            Backend::Worker { tasks, .. } => tasks
                .send(WorkerTask::Run(data))
                .map_err(|_| QueryError::ShuttingDown),
            Backend::Stopped => Err(QueryError::ShuttingDown),
        }
    }

    /// Block until every previously queued registration and update cycle
    /// has been processed. Returns immediately inline.
    pub fn sync(&self) -> Result<(), QueryError> {
        match &self.backend {
            Backend::Inline { .. } => Ok(()),
            Backend::Worker { tasks, .. } => {
                let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
                tasks
                    .send(WorkerTask::Sync(reply_tx))
                    .map_err(|_| QueryError::ShuttingDown)?;
                reply_rx.recv().map_err(|_| QueryError::ShuttingDown)
            }
            Backend::Stopped => Err(QueryError::ShuttingDown),
        }
    }
}

impl<C> QueryEngine<C> {
    /// Stop the engine: drop pending queries and join the worker.
    ///
    /// Idempotent. Called automatically on drop.
    pub fn shutdown(&mut self) {
        match std::mem::replace(&mut self.backend, Backend::Stopped) {
            Backend::Inline { jobs } => {
                self.pending.fetch_sub(jobs.len(), Ordering::AcqRel);
            }
            Backend::Worker { tasks, thread } => {
                // Closing the channel ends the worker loop.
                drop(tasks);
                if thread.join().is_err() {
                    tracing::error!("query worker panicked during shutdown");
                }
                tracing::debug!("query worker stopped");
            }
            Backend::Stopped => {}
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        matches!(self.backend, Backend::Stopped)
    }
}

impl<C> Drop for QueryEngine<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
