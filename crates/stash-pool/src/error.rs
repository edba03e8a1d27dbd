//! Pool-specific error types.

use std::error::Error;
use std::fmt;

use crate::handle::Handle;

/// Why a handle failed the validity check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleFault {
    /// The handle is the [`Handle::INVALID`] sentinel.
    Sentinel,
    /// The index is past the end of the arena.
    OutOfBounds {
        /// Number of slots in the arena.
        slot_count: usize,
    },
    /// The slot exists but holds no value.
    Vacant,
    /// The slot was reused: its stamp no longer matches the handle.
    StaleGeneration {
        /// The stamp currently recorded in the slot.
        current: u64,
    },
}

impl fmt::Display for HandleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sentinel => write!(f, "sentinel handle"),
            Self::OutOfBounds { slot_count } => {
                write!(f, "index out of bounds ({slot_count} slots)")
            }
            Self::Vacant => write!(f, "slot is vacant"),
            Self::StaleGeneration { current } => {
                write!(f, "stale generation (slot is at generation {current})")
            }
        }
    }
}

/// Errors that can occur during pool operations.
///
/// All of these are caller errors: a rejected call never mutates the pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// A handle that no longer (or never did) refer to a live value.
    InvalidHandle {
        /// The rejected handle.
        handle: Handle,
        /// Which part of the validity check failed.
        fault: HandleFault,
    },
    /// A cursor at an end position, or one whose slot has since been freed.
    InvalidCursor,
    /// More slots requested than handles can address.
    CapacityExceeded {
        /// Number of slots requested.
        requested: usize,
        /// Largest addressable slot count.
        max: usize,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHandle { handle, fault } => {
                write!(f, "invalid handle {handle}: {fault}")
            }
            Self::InvalidCursor => write!(f, "cursor does not point at a live value"),
            Self::CapacityExceeded { requested, max } => {
                write!(f, "pool capacity exceeded: requested {requested} slots, max {max}")
            }
        }
    }
}

impl Error for PoolError {}
