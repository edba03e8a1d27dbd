//! Iterator family over occupied slots.
//!
//! [`Iter`]/[`RevIter`] wrap a shared walker and [`IterMut`]/[`RevIterMut`]
//! wrap an exclusive one. Both walkers step with the cursor module's
//! `advance`. The exclusive walker hands out
//! `&mut T` by splitting its remaining slice window at each yielded slot, so
//! no two yielded references overlap.

use std::iter::FusedIterator;

use crate::cursor::{advance, Cursor, Direction};
use crate::handle::Handle;
use crate::slot::Slot;

fn handle_at<T>(slots: &[Slot<T>], local: usize, absolute: usize) -> Option<Handle> {
    let generation = slots.get(local)?.generation()?;
    Some(Handle::new(absolute as u32, generation))
}

struct Walker<'a, T> {
    slots: &'a [Slot<T>],
    next: Option<usize>,
    direction: Direction,
    remaining: usize,
}

// Manual impl: a derive would demand `T: Clone`.
impl<T> Clone for Walker<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            next: self.next,
            direction: self.direction,
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Walker<'a, T> {
    fn step(&mut self) -> Option<&'a T> {
        let pos = self.next?;
        self.next = advance(self.slots, pos, self.direction);
        self.remaining = self.remaining.saturating_sub(1);
        self.slots.get(pos)?.value()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(_) => (1.min(self.remaining), Some(self.remaining)),
            None => (0, Some(0)),
        }
    }

    fn handle(&self) -> Option<Handle> {
        let pos = self.next?;
        handle_at(self.slots, pos, pos)
    }
}

struct WalkerMut<'a, T> {
    /// Slots not yet yielded: `[offset..]` forward, `[..=next]` reverse.
    window: &'a mut [Slot<T>],
    offset: usize,
    next: Option<usize>,
    direction: Direction,
    remaining: usize,
}

impl<'a, T> WalkerMut<'a, T> {
    fn new(window: &'a mut [Slot<T>], next: Option<usize>, direction: Direction, remaining: usize) -> Self {
        Self {
            window,
            offset: 0,
            next,
            direction,
            remaining,
        }
    }

    fn step(&mut self) -> Option<&'a mut T> {
        let pos = self.next?;
        let local = pos.checked_sub(self.offset)?;
        if local >= self.window.len() {
            self.next = None;
            return None;
        }
        self.next = advance(self.window, local, self.direction).map(|i| i + self.offset);
        self.remaining = self.remaining.saturating_sub(1);

        let window = std::mem::take(&mut self.window);
        let slot = match self.direction {
            Direction::Forward => {
                let (head, tail) = window.split_at_mut(local + 1);
                self.window = tail;
                self.offset = pos + 1;
                head.last_mut()?
            }
            Direction::Reverse => {
                let (head, tail) = window.split_at_mut(local);
                self.window = head;
                tail.first_mut()?
            }
        };
        slot.value_mut()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(_) => (1.min(self.remaining), Some(self.remaining)),
            None => (0, Some(0)),
        }
    }

    fn handle(&self) -> Option<Handle> {
        let pos = self.next?;
        handle_at(self.window, pos.checked_sub(self.offset)?, pos)
    }
}

// ── Shared ──────────────────────────────────────────────────

/// Forward iterator over `&T`, lowest slot index first.
pub struct Iter<'a, T> {
    walker: Walker<'a, T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            walker: self.walker.clone(),
        }
    }
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(slots: &'a [Slot<T>], start: Option<usize>, remaining: usize) -> Self {
        Self {
            walker: Walker {
                slots,
                next: start,
                direction: Direction::Forward,
                remaining,
            },
        }
    }

    /// Position of the next item (end position once exhausted).
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.walker.next, Direction::Forward)
    }

    /// Handle of the next item, or `None` once exhausted.
    pub fn handle(&self) -> Option<Handle> {
        self.walker.handle()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.step()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.walker.size_hint()
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

/// Reverse iterator over `&T`, highest slot index first.
pub struct RevIter<'a, T> {
    walker: Walker<'a, T>,
}

impl<T> Clone for RevIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            walker: self.walker.clone(),
        }
    }
}

impl<'a, T> RevIter<'a, T> {
    pub(crate) fn new(slots: &'a [Slot<T>], start: Option<usize>, remaining: usize) -> Self {
        Self {
            walker: Walker {
                slots,
                next: start,
                direction: Direction::Reverse,
                remaining,
            },
        }
    }

    /// Position of the next item (end position once exhausted).
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.walker.next, Direction::Reverse)
    }

    /// Handle of the next item, or `None` once exhausted.
    pub fn handle(&self) -> Option<Handle> {
        self.walker.handle()
    }
}

impl<'a, T> Iterator for RevIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.step()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.walker.size_hint()
    }
}

impl<T> FusedIterator for RevIter<'_, T> {}

// ── Exclusive ───────────────────────────────────────────────

/// Forward iterator over `&mut T`, lowest slot index first.
pub struct IterMut<'a, T> {
    walker: WalkerMut<'a, T>,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(slots: &'a mut [Slot<T>], start: Option<usize>, remaining: usize) -> Self {
        Self {
            walker: WalkerMut::new(slots, start, Direction::Forward, remaining),
        }
    }

    /// Position of the next item (end position once exhausted).
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.walker.next, Direction::Forward)
    }

    /// Handle of the next item, or `None` once exhausted.
    pub fn handle(&self) -> Option<Handle> {
        self.walker.handle()
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.step()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.walker.size_hint()
    }
}

impl<T> FusedIterator for IterMut<'_, T> {}

/// Reverse iterator over `&mut T`, highest slot index first.
pub struct RevIterMut<'a, T> {
    walker: WalkerMut<'a, T>,
}

impl<'a, T> RevIterMut<'a, T> {
    pub(crate) fn new(slots: &'a mut [Slot<T>], start: Option<usize>, remaining: usize) -> Self {
        Self {
            walker: WalkerMut::new(slots, start, Direction::Reverse, remaining),
        }
    }

    /// Position of the next item (end position once exhausted).
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.walker.next, Direction::Reverse)
    }

    /// Handle of the next item, or `None` once exhausted.
    pub fn handle(&self) -> Option<Handle> {
        self.walker.handle()
    }
}

impl<'a, T> Iterator for RevIterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.step()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.walker.size_hint()
    }
}

impl<T> FusedIterator for RevIterMut<'_, T> {}
