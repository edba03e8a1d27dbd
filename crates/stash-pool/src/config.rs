//! Pool configuration parameters.

use crate::error::PoolError;

/// Configuration for an [`InstancePool`](crate::InstancePool).
///
/// The pool has no resizing policy beyond reservation, so the only knob is
/// how many slots to reserve up front.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of slots to reserve at construction.
    ///
    /// Default: 0 (grow on first insert). Reserving never constructs values.
    pub initial_capacity: usize,
}

impl PoolConfig {
    /// Default initial capacity.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 0;

    /// Largest number of slots a pool can index.
    ///
    /// One index value is reserved for [`Handle::INVALID`](crate::Handle::INVALID).
    pub const MAX_SLOTS: usize = crate::Handle::INVALID_INDEX as usize;

    /// Create a config that reserves `initial_capacity` slots.
    pub fn new(initial_capacity: usize) -> Self {
        Self { initial_capacity }
    }

    /// Check that the configured capacity is addressable by handles.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.initial_capacity > Self::MAX_SLOTS {
            return Err(PoolError::CapacityExceeded {
                requested: self.initial_capacity,
                max: Self::MAX_SLOTS,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY)
    }
}
