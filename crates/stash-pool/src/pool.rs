//! The instance pool: slot lifecycle, boundary tracking and lookups.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::config::PoolConfig;
use crate::cursor::{advance, Cursor, Direction};
use crate::error::{HandleFault, PoolError};
use crate::handle::Handle;
use crate::iter::{Iter, IterMut, RevIter, RevIterMut};
use crate::slot::Slot;

/// Dense, append-only arena handing out generation-checked [`Handle`]s.
///
/// Slots are never removed from the arena: removal frees a slot for reuse
/// and the next insertion takes the lowest free index before appending.
/// Values never move while stored, so handles to other values stay valid
/// across any sequence of insertions and removals.
///
/// The pool tracks its lowest and highest occupied slots ("boundaries") and
/// mirrors them as flags on the slots themselves. Traversal uses the flags
/// to stop without scanning trailing free slots, and `begin()`/`rbegin()`
/// are O(1). Removing a boundary slot re-scans for the new boundary.
///
/// Generation stamps come from one pool-wide counter that is bumped on every
/// insertion, so no two insertions into the same pool share a stamp.
///
/// Single-writer: all mutation goes through `&mut self`.
///
/// # Example
///
/// ```
/// use stash_pool::InstancePool;
///
/// let mut pool = InstancePool::new();
/// let a = pool.insert(100);
/// let b = pool.insert(200);
/// assert_eq!(pool[a], 100);
///
/// assert_eq!(pool.remove(a), Ok(100));
/// assert!(!pool.is_valid(a));
///
/// // The freed slot is reused, but the old handle stays dead.
/// let c = pool.insert(300);
/// assert_eq!(c.index(), a.index());
/// assert!(pool.get(a).is_none());
/// assert_eq!(pool.iter().copied().collect::<Vec<_>>(), vec![300, 200]);
/// # let _ = b;
/// ```
#[derive(Clone)]
pub struct InstancePool<T> {
    slots: Vec<Slot<T>>,
    /// Number of occupied slots.
    occupied: usize,
    /// Number of free slots.
    free: usize,
    /// Pool-wide stamp, incremented before every insertion.
    generation: u64,
    /// Lowest occupied slot index.
    first: Option<usize>,
    /// Highest occupied slot index.
    last: Option<usize>,
}

impl<T> InstancePool<T> {
    /// Create an empty pool with no reserved slots.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            occupied: 0,
            free: 0,
            generation: 0,
            first: None,
            last: None,
        }
    }

    /// Create an empty pool with room for `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut pool = Self::new();
        pool.slots.reserve(capacity);
        pool
    }

    /// Create a pool from a validated [`PoolConfig`].
    pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        Ok(Self::with_capacity(config.initial_capacity))
    }

    // ── Sizes ──────────────────────────────────────────────────

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Whether the pool stores no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots the arena can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of slots in the arena, occupied or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of free slots available for reuse.
    pub fn free_count(&self) -> usize {
        self.free
    }

    /// Current value of the pool-wide generation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reserve room for at least `additional` more slots.
    ///
    /// Never constructs values and never moves stored values in a way that
    /// affects handles: handles are indices, not addresses.
    pub fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
        tracing::debug!(
            additional,
            capacity = self.slots.capacity(),
            "pool reserved slots"
        );
    }

    // ── Insertion / removal ────────────────────────────────────

    /// Store `value` and return its handle.
    pub fn insert(&mut self, value: T) -> Handle {
        self.insert_with(|| value)
    }

    /// Store the value produced by `make` and return its handle.
    ///
    /// The slot is chosen before `make` runs; if `make` panics the pool is
    /// left as it was (apart from the generation counter).
    ///
    /// # Panics
    ///
    /// Panics if the arena already holds [`PoolConfig::MAX_SLOTS`] slots and
    /// none is free.
    pub fn insert_with<F>(&mut self, make: F) -> Handle
    where
        F: FnOnce() -> T,
    {
        self.generation += 1;
        let generation = self.generation;

        let reuse = if self.free > 0 {
            self.slots.iter().position(Slot::is_free)
        } else {
            None
        };

        let index = match reuse {
            Some(index) => {
                self.slots[index].fill(generation, make());
                self.free -= 1;
                index
            }
            None => {
                let index = self.slots.len();
                assert!(
                    index < PoolConfig::MAX_SLOTS,
                    "instance pool exhausted: {index} slots in use"
                );
                let value = make();
                let full = self.slots.len() == self.slots.capacity();
                self.slots.push(Slot::occupied(generation, value));
                if full {
                    tracing::trace!(
                        slots = self.slots.len(),
                        capacity = self.slots.capacity(),
                        "arena grew"
                    );
                }
                index
            }
        };

        self.extend_boundaries(index);
        self.occupied += 1;
        Handle::new(index as u32, generation)
    }

    /// Remove the value behind `handle` and return it.
    ///
    /// Fails with [`PoolError::InvalidHandle`] (leaving the pool untouched)
    /// if the handle is stale, vacant, out of bounds, or the sentinel.
    pub fn remove(&mut self, handle: Handle) -> Result<T, PoolError> {
        let slot_count = self.slots.len();
        let index = handle.index as usize;
        let current = match self.slots.get_mut(index) {
            None => None,
            Some(slot) => match slot.vacate(handle.generation) {
                Ok(value) => {
                    self.shrink_boundaries(index);
                    self.occupied -= 1;
                    self.free += 1;
                    return Ok(value);
                }
                Err(current) => Some(current),
            },
        };
        Err(reject(handle, current, slot_count))
    }

    /// Remove the value at `cursor` and return it.
    pub fn remove_at(&mut self, cursor: Cursor) -> Result<T, PoolError> {
        let handle = self.to_handle(cursor)?;
        self.remove(handle)
    }

    /// Drop every stored value and free all slots.
    ///
    /// Capacity, slot count and the generation counter are kept, so handles
    /// issued before the clear are rejected afterwards.
    pub fn clear(&mut self) {
        let dropped = self.occupied;
        for slot in &mut self.slots {
            slot.take();
            slot.first = false;
            slot.last = false;
        }
        self.occupied = 0;
        self.free = self.slots.len();
        self.first = None;
        self.last = None;
        tracing::debug!(dropped, slots = self.slots.len(), "pool cleared");
    }

    // ── Handle lookups ─────────────────────────────────────────

    /// Whether `handle` refers to a live value in this pool.
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.check(handle).is_ok()
    }

    /// Validate `handle`, reporting which part of the check failed.
    pub fn check(&self, handle: Handle) -> Result<(), PoolError> {
        self.lookup(handle).map(|_| ())
    }

    /// Shared reference to the value behind `handle`.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.lookup(handle).ok()
    }

    /// Exclusive reference to the value behind `handle`.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.lookup_mut(handle).ok()
    }

    fn lookup(&self, handle: Handle) -> Result<&T, PoolError> {
        let slot_count = self.slots.len();
        let current = match self.slots.get(handle.index as usize) {
            None => None,
            Some(slot) => match slot.stamped(handle.generation) {
                Ok(value) => return Ok(value),
                Err(current) => Some(current),
            },
        };
        Err(reject(handle, current, slot_count))
    }

    fn lookup_mut(&mut self, handle: Handle) -> Result<&mut T, PoolError> {
        let slot_count = self.slots.len();
        let current = match self.slots.get_mut(handle.index as usize) {
            None => None,
            Some(slot) => match slot.stamped_mut(handle.generation) {
                Ok(value) => return Ok(value),
                Err(current) => Some(current),
            },
        };
        Err(reject(handle, current, slot_count))
    }

    // ── Cursors ────────────────────────────────────────────────

    /// Position of the first value in forward order.
    pub fn begin(&self) -> Cursor {
        Cursor::new(self.first, Direction::Forward)
    }

    /// Past-the-end position in forward order.
    pub fn end(&self) -> Cursor {
        Cursor::end(Direction::Forward)
    }

    /// Position of the first value in reverse order.
    pub fn rbegin(&self) -> Cursor {
        Cursor::new(self.last, Direction::Reverse)
    }

    /// Past-the-end position in reverse order.
    pub fn rend(&self) -> Cursor {
        Cursor::end(Direction::Reverse)
    }

    /// The position after `cursor` in its direction.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        let next = cursor
            .position()
            .and_then(|pos| advance(&self.slots, pos, cursor.direction()));
        Cursor::new(next, cursor.direction())
    }

    /// Value at `cursor`, or `None` at an end position.
    pub fn get_at(&self, cursor: Cursor) -> Option<&T> {
        self.slots.get(cursor.position()?)?.value()
    }

    /// Exclusive value at `cursor`, or `None` at an end position.
    pub fn get_at_mut(&mut self, cursor: Cursor) -> Option<&mut T> {
        self.slots.get_mut(cursor.position()?)?.value_mut()
    }

    /// Handle for the value currently at `cursor`.
    pub fn to_handle(&self, cursor: Cursor) -> Result<Handle, PoolError> {
        let pos = cursor.position().ok_or(PoolError::InvalidCursor)?;
        let generation = self
            .slots
            .get(pos)
            .and_then(Slot::generation)
            .ok_or(PoolError::InvalidCursor)?;
        Ok(Handle::new(pos as u32, generation))
    }

    /// Forward cursor positioned at `handle`'s value.
    pub fn to_cursor(&self, handle: Handle) -> Result<Cursor, PoolError> {
        self.check(handle)?;
        Ok(Cursor::new(Some(handle.index as usize), Direction::Forward))
    }

    /// Reverse cursor positioned at `handle`'s value.
    pub fn to_reverse_cursor(&self, handle: Handle) -> Result<Cursor, PoolError> {
        self.check(handle)?;
        Ok(Cursor::new(Some(handle.index as usize), Direction::Reverse))
    }

    /// Handles of every stored value in forward order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        std::iter::successors(Some(self.begin()), move |&c| Some(self.advance(c)))
            .map_while(move |c| self.to_handle(c).ok())
    }

    // ── Iterators ──────────────────────────────────────────────

    /// Iterate values in forward (slot index) order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.slots, self.first, self.occupied)
    }

    /// Iterate values mutably in forward order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(&mut self.slots, self.first, self.occupied)
    }

    /// Iterate values in reverse order.
    pub fn rev_iter(&self) -> RevIter<'_, T> {
        RevIter::new(&self.slots, self.last, self.occupied)
    }

    /// Iterate values mutably in reverse order.
    pub fn rev_iter_mut(&mut self) -> RevIterMut<'_, T> {
        RevIterMut::new(&mut self.slots, self.last, self.occupied)
    }

    /// Forward iteration starting at `handle`'s value (inclusive).
    pub fn iter_from(&self, handle: Handle) -> Result<Iter<'_, T>, PoolError> {
        self.check(handle)?;
        Ok(Iter::new(&self.slots, Some(handle.index as usize), self.occupied))
    }

    /// Mutable forward iteration starting at `handle`'s value (inclusive).
    pub fn iter_mut_from(&mut self, handle: Handle) -> Result<IterMut<'_, T>, PoolError> {
        self.check(handle)?;
        let remaining = self.occupied;
        Ok(IterMut::new(
            &mut self.slots,
            Some(handle.index as usize),
            remaining,
        ))
    }

    /// Reverse iteration starting at `handle`'s value (inclusive).
    pub fn rev_iter_from(&self, handle: Handle) -> Result<RevIter<'_, T>, PoolError> {
        self.check(handle)?;
        Ok(RevIter::new(
            &self.slots,
            Some(handle.index as usize),
            self.occupied,
        ))
    }

    /// Mutable reverse iteration starting at `handle`'s value (inclusive).
    pub fn rev_iter_mut_from(&mut self, handle: Handle) -> Result<RevIterMut<'_, T>, PoolError> {
        self.check(handle)?;
        let remaining = self.occupied;
        Ok(RevIterMut::new(
            &mut self.slots,
            Some(handle.index as usize),
            remaining,
        ))
    }

    // ── Boundary maintenance ───────────────────────────────────

    /// Make `index` a boundary if it lies outside the current ones.
    fn extend_boundaries(&mut self, index: usize) {
        if self.first.is_none_or(|first| index < first) {
            if let Some(old) = self.first {
                self.slots[old].first = false;
            }
            self.slots[index].first = true;
            self.first = Some(index);
        }
        if self.last.is_none_or(|last| index > last) {
            if let Some(old) = self.last {
                self.slots[old].last = false;
            }
            self.slots[index].last = true;
            self.last = Some(index);
        }
    }

    /// Re-scan for new boundaries after slot `index` was freed.
    fn shrink_boundaries(&mut self, index: usize) {
        if self.slots[index].first {
            self.slots[index].first = false;
            self.first = self.slots[index + 1..]
                .iter()
                .position(Slot::is_occupied)
                .map(|offset| index + 1 + offset);
            if let Some(first) = self.first {
                self.slots[first].first = true;
            }
        }
        if self.slots[index].last {
            self.slots[index].last = false;
            self.last = self.slots[..index].iter().rposition(Slot::is_occupied);
            if let Some(last) = self.last {
                self.slots[last].last = true;
            }
        }
    }
}

/// Build the rejection for `handle`.
///
/// `current` is what the addressed slot holds: `None` when the index is out
/// of range, `Some(None)` for a free slot, `Some(Some(stamp))` for an
/// occupant with a different stamp.
fn reject(handle: Handle, current: Option<Option<u64>>, slot_count: usize) -> PoolError {
    let fault = if handle.is_sentinel() {
        HandleFault::Sentinel
    } else {
        match current {
            None => HandleFault::OutOfBounds { slot_count },
            Some(None) => HandleFault::Vacant,
            Some(Some(current)) => HandleFault::StaleGeneration { current },
        }
    };
    PoolError::InvalidHandle { handle, fault }
}

impl<T> Default for InstancePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Handle> for InstancePool<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `handle` is not valid for this pool.
    fn index(&self, handle: Handle) -> &T {
        match self.lookup(handle) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T> IndexMut<Handle> for InstancePool<T> {
    /// # Panics
    ///
    /// Panics if `handle` is not valid for this pool.
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        match self.lookup_mut(handle) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for InstancePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for handle in self.handles() {
            if let Some(value) = self.get(handle) {
                map.entry(&handle.index, value);
            }
        }
        map.finish()
    }
}

impl<'a, T> IntoIterator for &'a InstancePool<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut InstancePool<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> Extend<T> for InstancePool<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.slots.reserve(iter.size_hint().0.saturating_sub(self.free));
        for value in iter {
            let _ = self.insert(value);
        }
    }
}

impl<T> FromIterator<T> for InstancePool<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut pool = Self::new();
        pool.extend(iter);
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_test_utils::{Aligned64, DropLedger};

    fn values<T: Copy>(pool: &InstancePool<T>) -> Vec<T> {
        pool.iter().copied().collect()
    }

    fn rev_values<T: Copy>(pool: &InstancePool<T>) -> Vec<T> {
        pool.rev_iter().copied().collect()
    }

    /// Boundary fields and slot flags must agree with a brute-force scan.
    fn assert_boundaries<T>(pool: &InstancePool<T>) {
        let first = pool.slots.iter().position(Slot::is_occupied);
        let last = pool.slots.iter().rposition(Slot::is_occupied);
        assert_eq!(pool.first, first, "first boundary");
        assert_eq!(pool.last, last, "last boundary");
        for (i, slot) in pool.slots.iter().enumerate() {
            assert_eq!(slot.first, Some(i) == first, "first flag at {i}");
            assert_eq!(slot.last, Some(i) == last, "last flag at {i}");
        }
        let occupied = pool.slots.iter().filter(|s| s.is_occupied()).count();
        assert_eq!(pool.len(), occupied);
        assert_eq!(pool.free_count(), pool.slot_count() - occupied);
    }

    // ── Sizes ──────────────────────────────────────────────────

    #[test]
    fn size_counts_inserted_values() {
        let mut pool = InstancePool::new();
        pool.insert(100);
        pool.insert(200);
        pool.insert(300);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn empty_until_first_insert() {
        let mut pool = InstancePool::new();
        assert!(pool.is_empty());
        pool.insert(100);
        assert!(!pool.is_empty());
    }

    #[test]
    fn handle_is_steady_across_inserts() {
        let mut pool = InstancePool::new();
        let h = pool.insert(100);
        assert_eq!(h.index(), 0);
        pool.insert(200);
        assert_eq!(pool[h], 100);
    }

    #[test]
    fn with_config_reserves() {
        let pool: InstancePool<u8> = InstancePool::with_config(PoolConfig::new(32)).unwrap();
        assert!(pool.capacity() >= 32);
        assert_eq!(pool.slot_count(), 0);
    }

    #[test]
    fn with_config_rejects_unaddressable_capacity() {
        let result: Result<InstancePool<u8>, _> =
            InstancePool::with_config(PoolConfig::new(PoolConfig::MAX_SLOTS + 1));
        assert!(matches!(result, Err(PoolError::CapacityExceeded { .. })));
    }

    // ── Handles ────────────────────────────────────────────────

    #[test]
    fn removed_handle_is_invalid() {
        let mut pool = InstancePool::new();
        let h = pool.insert(1);
        assert!(pool.is_valid(h));
        assert_eq!(pool.remove(h), Ok(1));
        assert!(!pool.is_valid(h));
        assert_eq!(
            pool.check(h),
            Err(PoolError::InvalidHandle {
                handle: h,
                fault: HandleFault::Vacant
            })
        );
    }

    #[test]
    fn reused_slot_rejects_old_handle() {
        let mut pool = InstancePool::new();
        let old = pool.insert("old");
        pool.remove(old).unwrap();
        let new = pool.insert("new");
        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert!(!pool.is_valid(old));
        assert_eq!(
            pool.check(old),
            Err(PoolError::InvalidHandle {
                handle: old,
                fault: HandleFault::StaleGeneration {
                    current: new.generation()
                }
            })
        );
        assert_eq!(pool.get(new), Some(&"new"));
    }

    #[test]
    fn out_of_bounds_and_sentinel_faults() {
        let mut pool = InstancePool::new();
        pool.insert(0u8);
        let far = Handle::new(5, 1);
        assert_eq!(
            pool.check(far),
            Err(PoolError::InvalidHandle {
                handle: far,
                fault: HandleFault::OutOfBounds { slot_count: 1 }
            })
        );
        assert_eq!(
            pool.check(Handle::INVALID),
            Err(PoolError::InvalidHandle {
                handle: Handle::INVALID,
                fault: HandleFault::Sentinel
            })
        );
    }

    #[test]
    fn remove_reports_each_fault() {
        let mut pool = InstancePool::new();
        let vacant = pool.insert(1);
        let live = pool.insert(2);
        pool.remove(vacant).unwrap();

        let fault = |r: Result<i32, PoolError>| match r {
            Err(PoolError::InvalidHandle { fault, .. }) => fault,
            other => panic!("expected invalid handle, got {other:?}"),
        };
        assert_eq!(fault(pool.remove(vacant)), HandleFault::Vacant);
        assert_eq!(
            fault(pool.remove(Handle::new(9, 1))),
            HandleFault::OutOfBounds { slot_count: 2 }
        );
        assert_eq!(fault(pool.remove(Handle::INVALID)), HandleFault::Sentinel);
        let reused = pool.insert(3);
        assert_eq!(
            fault(pool.remove(vacant)),
            HandleFault::StaleGeneration {
                current: reused.generation()
            }
        );
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(live), Some(&2));
        assert_boundaries(&pool);
    }

    #[test]
    fn handle_at_slot_count_is_out_of_bounds() {
        let mut pool = InstancePool::new();
        let h = pool.insert(1);
        let just_past = Handle::new(1, h.generation());
        assert!(!pool.is_valid(just_past));
    }

    #[test]
    fn rejected_remove_leaves_pool_untouched() {
        let mut pool = InstancePool::new();
        let a = pool.insert(1);
        pool.insert(2);
        pool.remove(a).unwrap();
        let generation = pool.generation();
        assert!(pool.remove(a).is_err());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.generation(), generation);
        assert_boundaries(&pool);
    }

    #[test]
    fn generation_counter_is_pool_wide() {
        let mut pool = InstancePool::new();
        let a = pool.insert(1);
        let b = pool.insert(2);
        let c = pool.insert(3);
        assert_eq!(
            [a.generation(), b.generation(), c.generation()],
            [1, 2, 3]
        );
        assert_eq!(pool.generation(), 3);
    }

    #[test]
    fn get_mut_and_index_mut_modify() {
        let mut pool = InstancePool::new();
        let h = pool.insert(10);
        *pool.get_mut(h).unwrap() += 1;
        pool[h] *= 2;
        assert_eq!(pool[h], 22);
    }

    #[test]
    #[should_panic(expected = "invalid handle")]
    fn index_with_stale_handle_panics() {
        let mut pool = InstancePool::new();
        let h = pool.insert(1);
        pool.remove(h).unwrap();
        let _ = pool[h];
    }

    // ── Iteration ──────────────────────────────────────────────

    #[test]
    fn forward_iteration_in_insertion_order() {
        let mut pool = InstancePool::new();
        pool.insert(100);
        pool.insert(200);
        pool.insert(300);
        assert_eq!(values(&pool), vec![100, 200, 300]);
        assert_eq!(rev_values(&pool), vec![300, 200, 100]);
    }

    #[test]
    fn removing_middle_skips_it() {
        let mut pool = InstancePool::new();
        pool.insert(100);
        let mid = pool.insert(200);
        pool.insert(300);
        pool.remove(mid).unwrap();
        assert_eq!(values(&pool), vec![100, 300]);
        assert_eq!(rev_values(&pool), vec![300, 100]);
        assert_boundaries(&pool);
    }

    #[test]
    fn removing_last_moves_end() {
        let mut pool = InstancePool::new();
        pool.insert(100);
        pool.insert(200);
        let last = pool.insert(300);
        pool.remove(last).unwrap();
        assert_eq!(values(&pool), vec![100, 200]);
        assert_eq!(rev_values(&pool), vec![200, 100]);
        assert_boundaries(&pool);
    }

    #[test]
    fn removing_first_moves_begin() {
        let mut pool = InstancePool::new();
        let first = pool.insert(100);
        pool.insert(200);
        pool.insert(300);
        pool.remove(first).unwrap();
        assert_eq!(values(&pool), vec![200, 300]);
        assert_eq!(rev_values(&pool), vec![300, 200]);
        assert_eq!(pool.begin().position(), Some(1));
        assert_boundaries(&pool);
    }

    #[test]
    fn reuse_past_last_boundary_extends_iteration() {
        let mut pool = InstancePool::new();
        pool.insert(100);
        pool.insert(200);
        let last = pool.insert(300);
        pool.remove(last).unwrap();
        let h = pool.insert(400);
        assert_eq!(h.index(), 2);
        assert_eq!(values(&pool), vec![100, 200, 400]);
        assert_eq!(rev_values(&pool), vec![400, 200, 100]);
        assert_boundaries(&pool);
    }

    #[test]
    fn reuse_before_first_boundary_moves_begin() {
        let mut pool = InstancePool::new();
        let a = pool.insert(100);
        pool.insert(200);
        pool.remove(a).unwrap();
        pool.insert(50);
        assert_eq!(pool.begin().position(), Some(0));
        assert_eq!(values(&pool), vec![50, 200]);
        assert_boundaries(&pool);
    }

    #[test]
    fn removing_only_value_empties_boundaries() {
        let mut pool = InstancePool::new();
        let h = pool.insert(1);
        pool.remove(h).unwrap();
        assert_eq!(pool.begin(), pool.end());
        assert_eq!(pool.rbegin(), pool.rend());
        assert_boundaries(&pool);
        pool.insert(2);
        assert_eq!(values(&pool), vec![2]);
        assert_boundaries(&pool);
    }

    #[test]
    fn iteration_from_handle() {
        let mut pool = InstancePool::new();
        pool.insert(1);
        let mid = pool.insert(2);
        pool.insert(3);
        let forward: Vec<_> = pool.iter_from(mid).unwrap().copied().collect();
        let reverse: Vec<_> = pool.rev_iter_from(mid).unwrap().copied().collect();
        assert_eq!(forward, vec![2, 3]);
        assert_eq!(reverse, vec![2, 1]);

        for v in pool.iter_mut_from(mid).unwrap() {
            *v *= 10;
        }
        for v in pool.rev_iter_mut_from(mid).unwrap() {
            *v += 1;
        }
        assert_eq!(values(&pool), vec![2, 21, 30]);
    }

    #[test]
    fn iteration_from_stale_handle_fails() {
        let mut pool = InstancePool::new();
        let h = pool.insert(1);
        pool.remove(h).unwrap();
        assert!(pool.iter_from(h).is_err());
        assert!(pool.rev_iter_mut_from(h).is_err());
    }

    #[test]
    fn into_iterator_for_references() {
        let mut pool: InstancePool<i32> = (1..=3).collect();
        for v in &mut pool {
            *v += 1;
        }
        let sum: i32 = (&pool).into_iter().sum();
        assert_eq!(sum, 9);
    }

    // ── Cursors ────────────────────────────────────────────────

    #[test]
    fn cursor_walk_matches_iterator() {
        let mut pool = InstancePool::new();
        let hs: Vec<_> = (0..5).map(|i| pool.insert(i)).collect();
        pool.remove(hs[1]).unwrap();
        pool.remove(hs[3]).unwrap();

        let mut seen = Vec::new();
        let mut c = pool.begin();
        while c != pool.end() {
            seen.push(*pool.get_at(c).unwrap());
            c = pool.advance(c);
        }
        assert_eq!(seen, values(&pool));

        let mut seen = Vec::new();
        let mut c = pool.rbegin();
        while c != pool.rend() {
            seen.push(*pool.get_at(c).unwrap());
            c = pool.advance(c);
        }
        assert_eq!(seen, rev_values(&pool));
    }

    #[test]
    fn handle_cursor_conversions() {
        let mut pool = InstancePool::new();
        pool.insert('a');
        let b = pool.insert('b');
        let c = pool.to_cursor(b).unwrap();
        assert_eq!(pool.get_at(c), Some(&'b'));
        assert_eq!(pool.to_handle(c), Ok(b));
        let r = pool.to_reverse_cursor(b).unwrap();
        assert_eq!(pool.to_handle(pool.advance(r)).map(|h| pool[h]), Ok('a'));
        *pool.get_at_mut(c).unwrap() = 'B';
        assert_eq!(pool[b], 'B');
    }

    #[test]
    fn end_cursor_does_not_resolve() {
        let mut pool = InstancePool::new();
        pool.insert(1);
        assert_eq!(pool.get_at(pool.end()), None);
        assert_eq!(pool.to_handle(pool.end()), Err(PoolError::InvalidCursor));
        assert_eq!(pool.remove_at(pool.rend()), Err(PoolError::InvalidCursor));
    }

    #[test]
    fn remove_at_cursor() {
        let mut pool = InstancePool::new();
        pool.insert(1);
        pool.insert(2);
        let c = pool.rbegin();
        assert_eq!(pool.remove_at(c), Ok(2));
        assert_eq!(pool.remove_at(c), Err(PoolError::InvalidCursor));
        assert_eq!(values(&pool), vec![1]);
    }

    #[test]
    fn handles_lists_live_values_in_order() {
        let mut pool = InstancePool::new();
        let a = pool.insert(1);
        let b = pool.insert(2);
        let c = pool.insert(3);
        pool.remove(b).unwrap();
        assert_eq!(pool.handles().collect::<Vec<_>>(), vec![a, c]);
    }

    // ── Lifecycle ──────────────────────────────────────────────

    #[test]
    fn clear_drops_values_and_resets_boundaries() {
        let ledger = DropLedger::new();
        let mut pool = InstancePool::new();
        let hs: Vec<_> = (0..3).map(|i| pool.insert(ledger.track(i))).collect();
        pool.clear();
        assert_eq!(pool.len(), 0);
        assert_eq!(ledger.dropped(), 3);
        assert_eq!(pool.begin(), pool.end());
        assert_eq!(pool.rbegin(), pool.rend());
        assert_eq!(pool.free_count(), 3);
        assert!(hs.iter().all(|&h| !pool.is_valid(h)));
        assert_boundaries(&pool);
    }

    #[test]
    fn insert_after_clear_reuses_from_front() {
        let mut pool = InstancePool::new();
        for i in 0..4 {
            pool.insert(i);
        }
        pool.clear();
        let h = pool.insert(9);
        assert_eq!(h.index(), 0);
        assert_eq!(values(&pool), vec![9]);
        assert_boundaries(&pool);
    }

    #[test]
    fn drop_releases_remaining_values() {
        let ledger = DropLedger::new();
        {
            let mut pool = InstancePool::new();
            let h = pool.insert(ledger.track(1));
            pool.insert(ledger.track(2));
            drop(pool.remove(h).unwrap());
            assert_eq!(ledger.dropped(), 1);
        }
        assert_eq!(ledger.dropped(), 2);
    }

    #[test]
    fn insert_with_builds_in_place() {
        let ledger = DropLedger::new();
        let mut pool = InstancePool::new();
        let h = pool.insert_with(|| ledger.track(5));
        assert_eq!(ledger.created(), 1);
        assert_eq!(pool[h].value(), 5);
    }

    #[test]
    fn reserve_then_insert_keeps_capacity() {
        let ledger = DropLedger::new();
        let mut pool = InstancePool::new();
        pool.reserve(16);
        let capacity = pool.capacity();
        for i in 0..16 {
            pool.insert(ledger.track(i));
        }
        assert_eq!(pool.capacity(), capacity);
        assert_eq!(ledger.created(), 16);
        assert_eq!(ledger.dropped(), 0);
    }

    #[test]
    fn free_slot_reuse_does_not_grow() {
        let mut pool = InstancePool::new();
        let hs: Vec<_> = (0..4).map(|i| pool.insert(i)).collect();
        pool.remove(hs[2]).unwrap();
        let capacity = pool.capacity();
        let h = pool.insert(9);
        assert_eq!(h.index(), 2);
        assert_eq!(pool.slot_count(), 4);
        assert_eq!(pool.capacity(), capacity);
    }

    #[test]
    fn reuse_takes_lowest_free_slot() {
        let mut pool = InstancePool::new();
        let hs: Vec<_> = (0..5).map(|i| pool.insert(i)).collect();
        pool.remove(hs[3]).unwrap();
        pool.remove(hs[1]).unwrap();
        assert_eq!(pool.insert(10).index(), 1);
        assert_eq!(pool.insert(11).index(), 3);
        assert_eq!(pool.insert(12).index(), 5);
    }

    #[test]
    fn over_aligned_values_stay_aligned() {
        let mut pool = InstancePool::new();
        let hs: Vec<_> = (0..9).map(|i| pool.insert(Aligned64::new(i))).collect();
        pool.remove(hs[4]).unwrap();
        pool.insert(Aligned64::new(99));
        for v in pool.iter() {
            assert!(v.is_aligned());
        }
        for &h in &hs {
            if let Some(v) = pool.get(h) {
                assert_eq!((v as *const Aligned64 as usize) % 64, 0);
            }
        }
    }

    #[test]
    fn clone_is_independent() {
        let mut pool = InstancePool::new();
        let h = pool.insert(1);
        let mut copy = pool.clone();
        copy[h] = 2;
        assert_eq!(pool[h], 1);
        assert_eq!(copy[h], 2);
        assert_eq!(copy.generation(), pool.generation());
    }

    #[test]
    fn debug_lists_live_entries() {
        let mut pool = InstancePool::new();
        let a = pool.insert(1);
        pool.insert(2);
        pool.remove(a).unwrap();
        assert_eq!(format!("{pool:?}"), "{1: 2}");
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Insert(i32),
            /// Remove the n-th handle ever issued (modulo count).
            Remove(usize),
            Clear,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                6 => any::<i32>().prop_map(Op::Insert),
                4 => any::<usize>().prop_map(Op::Remove),
                1 => Just(Op::Clear),
            ]
        }

        proptest! {
            #[test]
            fn matches_reference_model(ops in proptest::collection::vec(op(), 1..80)) {
                let mut pool = InstancePool::new();
                // Reference: slot index -> value, plus every handle ever issued.
                let mut model: Vec<Option<i32>> = Vec::new();
                let mut issued: Vec<Handle> = Vec::new();

                for op in ops {
                    match op {
                        Op::Insert(v) => {
                            let h = pool.insert(v);
                            prop_assert!(pool.is_valid(h));
                            let idx = h.index() as usize;
                            let expected = model.iter().position(Option::is_none).unwrap_or(model.len());
                            prop_assert_eq!(idx, expected);
                            if idx == model.len() {
                                model.push(Some(v));
                            } else {
                                model[idx] = Some(v);
                            }
                            issued.push(h);
                        }
                        Op::Remove(n) => {
                            if issued.is_empty() {
                                continue;
                            }
                            let h = issued[n % issued.len()];
                            let was_valid = pool.is_valid(h);
                            let removed = pool.remove(h);
                            prop_assert_eq!(removed.is_ok(), was_valid);
                            if let Ok(v) = removed {
                                prop_assert_eq!(model[h.index() as usize].take(), Some(v));
                            }
                            prop_assert!(!pool.is_valid(h));
                        }
                        Op::Clear => {
                            pool.clear();
                            model.iter_mut().for_each(|s| *s = None);
                        }
                    }

                    assert_boundaries(&pool);
                    let forward: Vec<i32> = model.iter().flatten().copied().collect();
                    let mut reverse = forward.clone();
                    reverse.reverse();
                    prop_assert_eq!(values(&pool), forward);
                    prop_assert_eq!(rev_values(&pool), reverse);
                    prop_assert_eq!(pool.is_empty(), pool.len() == 0);
                }
            }

            #[test]
            fn removed_handles_never_revalidate(
                rounds in proptest::collection::vec(1usize..8, 1..20),
            ) {
                let mut pool = InstancePool::new();
                let mut dead: Vec<Handle> = Vec::new();
                for n in rounds {
                    let hs: Vec<_> = (0..n).map(|i| pool.insert(i)).collect();
                    for h in hs {
                        pool.remove(h).unwrap();
                        dead.push(h);
                    }
                    for &h in &dead {
                        prop_assert!(!pool.is_valid(h));
                    }
                }
            }
        }
    }
}
