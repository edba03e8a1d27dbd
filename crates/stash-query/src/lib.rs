//! Snapshot query engine.
//!
//! A [`QueryEngine`] owns a read-only snapshot of some data (typically an
//! [`InstancePool`](https://docs.rs/stash-pool) clone) and runs registered
//! closures against it once per [`update`](QueryEngine::update) cycle.
//!
//! Results come back through channels rather than shared state:
//!
//! - [`QueryEngine::register`] returns a [`QueryTicket`] that resolves once.
//! - [`QueryEngine::subscribe`] returns a [`QueryStream`] that receives one
//!   result per cycle until it is dropped.
//!
//! # Execution modes
//!
//! ```text
//! Inline:  update() ──► run jobs on caller thread ──► tickets resolved
//!
//! Worker:  register() ─┐
//!          update()  ──┼──► bounded task queue ──► worker thread
//!          sync()    ──┘                           (owns the jobs)
//! ```
//!
//! The worker processes tasks strictly in submission order, so a query
//! registered before an `update()` always sees that update's snapshot.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod ticket;

mod job;
mod worker;

pub use config::{ExecMode, QueryConfig};
pub use engine::QueryEngine;
pub use error::QueryError;
pub use ticket::{QueryStream, QueryTicket};
