//! Result handles returned by query registration.
//!
//! A [`QueryTicket`] is the receiving end of a one-slot channel: the query
//! sends exactly one result and drops its sender. A [`QueryStream`] is the
//! receiving end of an unbounded channel fed once per update cycle.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::error::QueryError;

/// Future-like handle for a one-shot query result.
#[derive(Debug)]
#[must_use = "a ticket is the only way to observe the query result"]
pub struct QueryTicket<R> {
    rx: Receiver<R>,
}

impl<R> QueryTicket<R> {
    pub(crate) fn new(rx: Receiver<R>) -> Self {
        Self { rx }
    }

    /// Block until the result arrives.
    ///
    /// Returns [`QueryError::Abandoned`] if the query can no longer run.
    pub fn wait(self) -> Result<R, QueryError> {
        self.rx.recv().map_err(|_| QueryError::Abandoned)
    }

    /// Block for at most `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<R, QueryError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => QueryError::Timeout,
            RecvTimeoutError::Disconnected => QueryError::Abandoned,
        })
    }

    /// Take the result if it is ready.
    pub fn try_take(&self) -> Result<Option<R>, QueryError> {
        match self.rx.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(QueryError::Abandoned),
        }
    }
}

/// Receiver for a standing query: one result per update cycle.
///
/// Dropping the stream retires the query at its next run.
#[derive(Debug)]
pub struct QueryStream<R> {
    rx: Receiver<R>,
}

impl<R> QueryStream<R> {
    pub(crate) fn new(rx: Receiver<R>) -> Self {
        Self { rx }
    }

    /// Block until the next result.
    pub fn recv(&self) -> Result<R, QueryError> {
        self.rx.recv().map_err(|_| QueryError::Abandoned)
    }

    /// Block for at most `timeout` for the next result.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<R, QueryError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => QueryError::Timeout,
            RecvTimeoutError::Disconnected => QueryError::Abandoned,
        })
    }

    /// Take the next result if one is ready.
    pub fn try_recv(&self) -> Result<Option<R>, QueryError> {
        match self.rx.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(QueryError::Abandoned),
        }
    }

    /// All results delivered so far, oldest first.
    pub fn drain(&self) -> Vec<R> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_yields_buffered_value_after_sender_drop() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        tx.send(5).unwrap();
        drop(tx);
        assert_eq!(QueryTicket::new(rx).wait(), Ok(5));
    }

    #[test]
    fn ticket_without_sender_is_abandoned() {
        let (tx, rx) = crossbeam_channel::bounded::<u8>(1);
        drop(tx);
        let ticket = QueryTicket::new(rx);
        assert_eq!(ticket.try_take(), Err(QueryError::Abandoned));
        assert_eq!(ticket.wait(), Err(QueryError::Abandoned));
    }

    #[test]
    fn ticket_times_out_while_pending() {
        let (_tx, rx) = crossbeam_channel::bounded::<u8>(1);
        let ticket = QueryTicket::new(rx);
        assert_eq!(ticket.try_take(), Ok(None));
        assert_eq!(
            ticket.wait_timeout(Duration::from_millis(5)),
            Err(QueryError::Timeout)
        );
    }

    #[test]
    fn stream_times_out_between_results() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let stream = QueryStream::new(rx);
        assert_eq!(
            stream.recv_timeout(Duration::from_millis(5)),
            Err(QueryError::Timeout)
        );
        tx.send(9).unwrap();
        assert_eq!(stream.recv_timeout(Duration::from_millis(5)), Ok(9));
        drop(tx);
        assert_eq!(
            stream.recv_timeout(Duration::from_millis(5)),
            Err(QueryError::Abandoned)
        );
    }

    #[test]
    fn stream_drains_in_order() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let stream = QueryStream::new(rx);
        for i in 0..3 {
            tx.send(i).unwrap();
        }
        assert_eq!(stream.drain(), vec![0, 1, 2]);
        assert_eq!(stream.try_recv(), Ok(None));
        drop(tx);
        assert_eq!(stream.recv(), Err(QueryError::Abandoned));
    }
}
