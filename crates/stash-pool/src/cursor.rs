//! Traversal positions and the shared skip-free-slots step.
//!
//! A [`Cursor`] is a plain position token: a slot index (or the end
//! position) plus a direction. It does not borrow the pool, so it can be
//! stored and compared freely; resolving it goes back through the pool
//! ([`InstancePool::get_at`](crate::InstancePool::get_at),
//! [`InstancePool::to_handle`](crate::InstancePool::to_handle)).
//!
//! Every iterator and the cursor API step through the arena with
//! `advance`, so the skip logic lives in exactly one place.

use crate::slot::Slot;

/// Traversal direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards higher slot indices (`begin()` to `end()`).
    Forward,
    /// Towards lower slot indices (`rbegin()` to `rend()`).
    Reverse,
}

/// A position in a pool traversal.
///
/// `position() == None` is the past-the-end position for the cursor's
/// direction. Two cursors compare equal when they name the same slot in the
/// same direction, so `pool.begin() == pool.end()` holds exactly when the
/// pool is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cursor {
    position: Option<usize>,
    direction: Direction,
}

impl Cursor {
    pub(crate) fn new(position: Option<usize>, direction: Direction) -> Self {
        Self {
            position,
            direction,
        }
    }

    pub(crate) fn end(direction: Direction) -> Self {
        Self::new(None, direction)
    }

    /// Slot index, or `None` at the end position.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Direction this cursor advances in.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether this is the past-the-end position.
    pub fn is_end(&self) -> bool {
        self.position.is_none()
    }
}

/// Step from slot `from` to the next occupied slot in `direction`.
///
/// Returns `None` when `from` carries the boundary flag for `direction`
/// (it was the last occupied slot that way) or when the walk leaves the
/// slice. Free slots in between are skipped.
pub(crate) fn advance<T>(slots: &[Slot<T>], from: usize, direction: Direction) -> Option<usize> {
    if slots.get(from)?.ends(direction) {
        return None;
    }
    let mut index = from;
    loop {
        index = match direction {
            Direction::Forward => index + 1,
            Direction::Reverse => index.checked_sub(1)?,
        };
        let slot = slots.get(index)?;
        if slot.is_occupied() || slot.ends(direction) {
            return Some(index);
        }
    }
}
