//! Type-erased query jobs.
//!
//! A job is a boxed closure over the snapshot type that reports whether it
//! wants to run again. One-shot queries finish after their first run;
//! standing queries keep running until their stream is dropped.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ticket::{QueryStream, QueryTicket};

/// Whether a job stays registered after a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JobStatus {
    Done,
    Again,
}

pub(crate) type Job<C> = Box<dyn FnMut(&C) -> JobStatus + Send>;

/// Wrap a one-shot query; its result goes to the returned ticket.
pub(crate) fn once<C, R, F>(query: F) -> (Job<C>, QueryTicket<R>)
where
    C: 'static,
    R: Send + 'static,
    F: FnOnce(&C) -> R + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    let mut query = Some(query);
    let job: Job<C> = Box::new(move |data: &C| {
        if let Some(query) = query.take() {
            // Ticket may already be dropped.
            let _ = tx.send(query(data));
        }
        JobStatus::Done
    });
    (job, QueryTicket::new(rx))
}

/// Wrap a standing query; each run's result goes to the returned stream.
pub(crate) fn standing<C, R, F>(mut query: F) -> (Job<C>, QueryStream<R>)
where
    C: 'static,
    R: Send + 'static,
    F: FnMut(&C) -> R + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::unbounded();
    let job: Job<C> = Box::new(move |data: &C| match tx.send(query(data)) {
        Ok(()) => JobStatus::Again,
        Err(_) => JobStatus::Done,
    });
    (job, QueryStream::new(rx))
}

/// Run every job once against `data`, keeping those that want another run.
/// Returns the number of jobs retired.
///
/// `pending` is decremented as each job retires, so the count stays exact
/// even if a later job unwinds out of this call.
pub(crate) fn run_all<C>(jobs: &mut Vec<Job<C>>, data: &C, pending: &AtomicUsize) -> usize {
    let before = jobs.len();
    jobs.retain_mut(|job| retain(job(data), pending));
    before - jobs.len()
}

/// Like [`run_all`], but a panicking job is retired instead of unwinding.
pub(crate) fn run_all_guarded<C>(
    jobs: &mut Vec<Job<C>>,
    data: &C,
    pending: &AtomicUsize,
) -> usize {
    let before = jobs.len();
    jobs.retain_mut(
        |job| match panic::catch_unwind(AssertUnwindSafe(|| job(data))) {
            Ok(status) => retain(status, pending),
            Err(_) => {
                tracing::error!("query panicked; retiring it");
                retain(JobStatus::Done, pending)
            }
        },
    );
    before - jobs.len()
}

fn retain(status: JobStatus, pending: &AtomicUsize) -> bool {
    match status {
        JobStatus::Again => true,
        JobStatus::Done => {
            pending.fetch_sub(1, Ordering::AcqRel);
            false
        }
    }
}
