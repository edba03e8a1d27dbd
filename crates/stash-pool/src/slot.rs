//! Arena slots.
//!
//! A slot owns at most one value. The occupancy state is an enum, so the
//! value exists exactly when the slot is occupied and is dropped when the
//! slot is freed. Boundary flags mark the lowest and highest occupied slots
//! so traversal knows where to stop without consulting the pool.

use crate::cursor::Direction;

#[derive(Clone, Debug)]
pub(crate) enum SlotState<T> {
    Free,
    Occupied { generation: u64, value: T },
}

#[derive(Clone, Debug)]
pub(crate) struct Slot<T> {
    pub(crate) state: SlotState<T>,
    /// Lowest occupied slot in the arena.
    pub(crate) first: bool,
    /// Highest occupied slot in the arena.
    pub(crate) last: bool,
}

impl<T> Slot<T> {
    pub(crate) fn occupied(generation: u64, value: T) -> Self {
        Self {
            state: SlotState::Occupied { generation, value },
            first: false,
            last: false,
        }
    }

    pub(crate) fn is_occupied(&self) -> bool {
        matches!(self.state, SlotState::Occupied { .. })
    }

    pub(crate) fn is_free(&self) -> bool {
        !self.is_occupied()
    }

    /// Stamp of the current occupant, if any.
    pub(crate) fn generation(&self) -> Option<u64> {
        match self.state {
            SlotState::Occupied { generation, .. } => Some(generation),
            SlotState::Free => None,
        }
    }

    pub(crate) fn value(&self) -> Option<&T> {
        match &self.state {
            SlotState::Occupied { value, .. } => Some(value),
            SlotState::Free => None,
        }
    }

    pub(crate) fn value_mut(&mut self) -> Option<&mut T> {
        match &mut self.state {
            SlotState::Occupied { value, .. } => Some(value),
            SlotState::Free => None,
        }
    }

    /// The value, if the occupant carries `generation`. Otherwise the
    /// stamp the slot does carry (`None` when free).
    pub(crate) fn stamped(&self, generation: u64) -> Result<&T, Option<u64>> {
        match &self.state {
            SlotState::Occupied {
                generation: current,
                value,
            } if *current == generation => Ok(value),
            SlotState::Occupied {
                generation: current,
                ..
            } => Err(Some(*current)),
            SlotState::Free => Err(None),
        }
    }

    /// Exclusive form of [`stamped`](Self::stamped).
    pub(crate) fn stamped_mut(&mut self, generation: u64) -> Result<&mut T, Option<u64>> {
        match &mut self.state {
            SlotState::Occupied {
                generation: current,
                value,
            } if *current == generation => Ok(value),
            SlotState::Occupied {
                generation: current,
                ..
            } => Err(Some(*current)),
            SlotState::Free => Err(None),
        }
    }

    /// Free the slot if its occupant carries `generation`, returning the
    /// value. On mismatch the slot is left as it was.
    pub(crate) fn vacate(&mut self, generation: u64) -> Result<T, Option<u64>> {
        match std::mem::replace(&mut self.state, SlotState::Free) {
            SlotState::Occupied {
                generation: current,
                value,
            } if current == generation => Ok(value),
            other => {
                self.state = other;
                Err(self.generation())
            }
        }
    }

    /// Move a value into a free slot.
    pub(crate) fn fill(&mut self, generation: u64, value: T) {
        debug_assert!(self.is_free(), "fill on an occupied slot");
        self.state = SlotState::Occupied { generation, value };
    }

    /// Move the value out, leaving the slot free. Boundary flags are untouched.
    pub(crate) fn take(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.state, SlotState::Free) {
            SlotState::Occupied { value, .. } => Some(value),
            SlotState::Free => None,
        }
    }

    /// Whether traversal in `direction` ends after this slot.
    pub(crate) fn ends(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.last,
            Direction::Reverse => self.first,
        }
    }
}
