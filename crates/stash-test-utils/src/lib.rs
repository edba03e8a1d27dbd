//! Test utilities and fixture types for stash development.
//!
//! Provides a construct/drop counting value ([`Tracked`], issued by a
//! [`DropLedger`]), an over-aligned value type ([`Aligned64`]), and small
//! helpers for building and reading back pools.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stash_pool::{Handle, InstancePool};

#[derive(Default)]
struct Counts {
    created: AtomicUsize,
    dropped: AtomicUsize,
}

/// Shared construct/drop counters.
///
/// Every [`Tracked`] value issued by [`track`](DropLedger::track) bumps
/// `created` once and `dropped` once when it is dropped. Clones of a
/// `Tracked` count as new constructions.
#[derive(Clone, Default)]
pub struct DropLedger {
    counts: Arc<Counts>,
}

impl DropLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a counted value.
    pub fn track(&self, value: impl Into<i64>) -> Tracked {
        self.counts.created.fetch_add(1, Ordering::Relaxed);
        Tracked {
            value: value.into(),
            counts: Arc::clone(&self.counts),
        }
    }

    /// Number of values constructed (including clones).
    pub fn created(&self) -> usize {
        self.counts.created.load(Ordering::Relaxed)
    }

    /// Number of values dropped.
    pub fn dropped(&self) -> usize {
        self.counts.dropped.load(Ordering::Relaxed)
    }

    /// Values constructed but not yet dropped.
    pub fn live(&self) -> usize {
        self.created() - self.dropped()
    }
}

/// A value that reports its construction and drop to a [`DropLedger`].
#[derive(Debug)]
pub struct Tracked {
    value: i64,
    counts: Arc<Counts>,
}

impl Tracked {
    pub fn value(&self) -> i64 {
        self.value
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        self.counts.created.fetch_add(1, Ordering::Relaxed);
        Self {
            value: self.value,
            counts: Arc::clone(&self.counts),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.counts.dropped.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for Counts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counts")
            .field("created", &self.created.load(Ordering::Relaxed))
            .field("dropped", &self.dropped.load(Ordering::Relaxed))
            .finish()
    }
}

/// A value with 64-byte alignment, wider than any primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(align(64))]
pub struct Aligned64 {
    pub value: u32,
}

impl Aligned64 {
    pub fn new(value: u32) -> Self {
        Self { value }
    }

    /// Whether this reference honours the type's alignment.
    pub fn is_aligned(&self) -> bool {
        (self as *const Self as usize) % std::mem::align_of::<Self>() == 0
    }
}

/// Build a pool holding `values` in order, returning the issued handles.
pub fn pool_of<T: Clone>(values: &[T]) -> (InstancePool<T>, Vec<Handle>) {
    let mut pool = InstancePool::with_capacity(values.len());
    let handles = values.iter().cloned().map(|v| pool.insert(v)).collect();
    (pool, handles)
}

/// Forward iteration order, cloned out.
pub fn forward<T: Clone>(pool: &InstancePool<T>) -> Vec<T> {
    pool.iter().cloned().collect()
}

/// Reverse iteration order, cloned out.
pub fn reverse<T: Clone>(pool: &InstancePool<T>) -> Vec<T> {
    pool.rev_iter().cloned().collect()
}
