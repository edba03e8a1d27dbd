//! Worker thread loop for [`ExecMode::Worker`](crate::ExecMode::Worker).
//!
//! The worker owns the registered jobs exclusively (moved in through the
//! task channel). The engine never touches them again, so there are no
//! locks: registrations, update cycles and sync barriers are all messages
//! processed in FIFO order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::job::{run_all_guarded, Job};

/// A message for the worker thread.
pub(crate) enum WorkerTask<C> {
    /// Add a job to the worker's registry.
    Register(Job<C>),
    /// Run every registered job against this snapshot.
    Run(Arc<C>),
    /// Reply once every earlier task has been processed.
    Sync(Sender<()>),
}

/// Main loop for the worker thread.
///
/// Runs until the task channel is closed (engine dropped or shut down).
/// `pending` is decremented for every job the worker retires.
pub(crate) fn worker_loop<C>(task_rx: Receiver<WorkerTask<C>>, pending: Arc<AtomicUsize>) {
    let mut jobs: Vec<Job<C>> = Vec::new();
    let mut cycles = 0u64;

    while let Ok(task) = task_rx.recv() {
        match task {
            WorkerTask::Register(job) => jobs.push(job),
            WorkerTask::Run(data) => {
                let retired = run_all_guarded(&mut jobs, &data, &pending);
                cycles += 1;
                tracing::trace!(cycles, retired, remaining = jobs.len(), "query cycle");
            }
            WorkerTask::Sync(reply) => {
                // Caller may have given up waiting.
                let _ = reply.send(());
            }
        }
    }

    // Channel closed; remaining jobs drop here and their tickets see Abandoned.
    pending.fetch_sub(jobs.len(), Ordering::AcqRel);
    tracing::debug!(cycles, abandoned = jobs.len(), "query worker exiting");
}
