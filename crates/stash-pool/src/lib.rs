//! Generational instance pool.
//!
//! [`InstancePool`] is a dense, append-only arena of slots. Inserting a value
//! returns a [`Handle`] (slot index + generation stamp) that stays valid
//! until that value is removed, and is rejected forever after, even when
//! the slot is reused. Removal never shifts other values.
//!
//! # Architecture
//!
//! ```text
//! InstancePool<T>
//! ├── Vec<Slot<T>>            append-only; slots are freed, never dropped
//! │   └── Slot { Free | Occupied { generation, value }, first, last }
//! ├── generation: u64          pool-wide, bumped on every insert
//! └── first / last boundary    lowest / highest occupied slot
//! ```
//!
//! Traversal comes in four flavours ([`Iter`], [`IterMut`], [`RevIter`],
//! [`RevIterMut`]) plus a position-token API ([`Cursor`]) with explicit
//! `begin()/end()/rbegin()/rend()`. All of them share one step function
//! that skips free slots and stops at the boundary flag.
//!
//! # Errors
//!
//! Handle misuse is reported as [`PoolError::InvalidHandle`] with a
//! [`HandleFault`] explaining which check failed. Rejected calls never
//! mutate the pool.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod handle;
pub mod iter;
pub mod pool;
mod slot;

// Public re-exports for the primary API surface.
pub use config::PoolConfig;
pub use cursor::{Cursor, Direction};
pub use error::{HandleFault, PoolError};
pub use handle::Handle;
pub use iter::{Iter, IterMut, RevIter, RevIterMut};
pub use pool::InstancePool;
