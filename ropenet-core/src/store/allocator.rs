//! Identity allocator: one id sequence for every entity kind.

use crate::model::EntityId;

/// Issues strictly increasing ids.
///
/// A single allocator is owned by the store and shared by every instance, so
/// switching instances never rewinds the sequence.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Allocator whose first id is `first` (at least 1)
    pub fn new(first: u64) -> Self {
        Self { next: first.max(1) }
    }

    /// Allocator whose first id is the larger of `first` and one past `highest_seen`
    pub fn starting_after(highest_seen: Option<EntityId>, first: u64) -> Self {
        let floor = highest_seen.map(|id| id.0.saturating_add(1)).unwrap_or(1);
        Self::new(first.max(floor))
    }

    /// Issue the next id
    pub fn next(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// The id the next call will return
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_ids_strictly_increase(first in 0u64..1_000_000, count in 1usize..500) {
            let mut alloc = IdAllocator::new(first);
            let ids: Vec<EntityId> = (0..count).map(|_| alloc.next()).collect();

            for pair in ids.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }
}
