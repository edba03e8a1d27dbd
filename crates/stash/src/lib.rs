//! Stash: a generational instance pool with a snapshot query engine.
//!
//! This is the facade crate re-exporting the public API of the Stash
//! sub-crates. Depend on `stash` alone unless you need only one half.
//!
//! # Quick start
//!
//! ```rust
//! use stash::prelude::*;
//!
//! let mut pool = InstancePool::new();
//! let a = pool.insert("alpha");
//! let b = pool.insert("beta");
//! pool.remove(a).unwrap();
//! assert!(!pool.is_valid(a));
//! assert_eq!(pool[b], "beta");
//!
//! // Query a frozen copy of the pool.
//! let mut engine = QueryEngine::inline();
//! engine.set_data(pool.clone());
//! let names = engine.register(|p: &InstancePool<&'static str>| {
//!     p.iter().copied().collect::<Vec<_>>()
//! });
//! engine.update().unwrap();
//! assert_eq!(names.wait().unwrap(), vec!["beta"]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`pool`] | `stash-pool` | `InstancePool`, handles, cursors, iterators |
//! | [`query`] | `stash-query` | `QueryEngine`, tickets, streams, exec modes |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Generational instance pool (`stash-pool`).
///
/// [`pool::InstancePool`] stores values behind [`pool::Handle`]s that go
/// stale once their value is removed.
pub use stash_pool as pool;

/// Snapshot query engine (`stash-query`).
///
/// [`query::QueryEngine`] runs closures against a shared snapshot, inline
/// or on a worker thread.
pub use stash_query as query;

/// Common imports.
///
/// ```rust
/// use stash::prelude::*;
/// ```
pub mod prelude {
    // Pool
    pub use stash_pool::{Cursor, Direction, Handle, InstancePool, PoolConfig};

    // Query
    pub use stash_query::{ExecMode, QueryConfig, QueryEngine, QueryStream, QueryTicket};

    // Errors
    pub use stash_pool::{HandleFault, PoolError};
    pub use stash_query::QueryError;
}
