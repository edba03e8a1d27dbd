//! Pool handles.
//!
//! A [`Handle`] is a weak reference into an
//! [`InstancePool`](crate::InstancePool): a slot index plus the generation
//! stamp the slot carried when the value was inserted. The stamp allows O(1)
//! staleness checks without a lookup table.

use std::fmt;

/// Stable reference to a value stored in an [`InstancePool`](crate::InstancePool).
///
/// Handles do not own or borrow the value. A handle stays valid until the
/// value it was issued for is removed; after that it is rejected forever,
/// even when a later insertion reuses the same slot index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct Handle {
    /// Slot index within the arena.
    pub(crate) index: u32,
    /// Pool generation when the value was inserted.
    pub(crate) generation: u64,
}

impl Handle {
    /// Slot index reserved for the "no value" sentinel.
    pub const INVALID_INDEX: u32 = u32::MAX;

    /// Handle that never refers to a value.
    pub const INVALID: Handle = Handle {
        index: Self::INVALID_INDEX,
        generation: 0,
    };

    pub(crate) fn new(index: u32, generation: u64) -> Self {
        Self { index, generation }
    }

    /// Slot index this handle points at.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation stamp recorded at insertion.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this is the [`Handle::INVALID`] sentinel.
    ///
    /// A non-sentinel handle can still be stale; use
    /// [`InstancePool::is_valid`](crate::InstancePool::is_valid) for that.
    pub fn is_sentinel(&self) -> bool {
        self.index == Self::INVALID_INDEX
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            return write!(f, "Handle(invalid)");
        }
        write!(f, "Handle(idx={}, gen={})", self.index, self.generation)
    }
}
