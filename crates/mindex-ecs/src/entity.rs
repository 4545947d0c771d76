//! Entity handles and the slot allocator behind them.
//!
//! An entity is a slot index plus the generation the slot had when the
//! entity was spawned. Freeing a slot bumps its generation, so handles to a
//! despawned entity stop matching as soon as it goes. Handles are store
//! primaries: they order by slot first, then generation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a spawned entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    slot: u32,
    generation: u32,
}

impl EntityId {
    /// Slot this entity occupies.
    pub fn index(self) -> u32 {
        self.slot
    }

    /// Generation of the slot when this entity was spawned.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Occupied { generation: u32 },
    Vacant { generation: u32 },
}

/// Slot allocator for [`EntityId`]s.
///
/// Freed slots are reused most-recent first. A slot whose generation counter
/// is used up is retired rather than reused, so a stale handle can never
/// match again.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    live: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a handle, reusing a vacant slot when one is available.
    ///
    /// # Panics
    ///
    /// If more than `u32::MAX` slots are ever created.
    pub fn allocate(&mut self) -> EntityId {
        let id = match self.vacant.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                let (Slot::Vacant { generation } | Slot::Occupied { generation }) = *entry;
                *entry = Slot::Occupied { generation };
                EntityId { slot, generation }
            }
            None => {
                let slot = u32::try_from(self.slots.len()).expect("entity slots exhausted");
                self.slots.push(Slot::Occupied { generation: 0 });
                EntityId { slot, generation: 0 }
            }
        };
        self.live += 1;
        id
    }

    /// Free the slot held by `id`. Returns `false` for a handle that is not
    /// alive.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.live -= 1;
        match id.generation.checked_add(1) {
            Some(generation) => {
                self.slots[id.slot as usize] = Slot::Vacant { generation };
                self.vacant.push(id.slot);
            }
            None => {
                // Retired: stays vacant but never goes back on the list.
                self.slots[id.slot as usize] = Slot::Vacant {
                    generation: u32::MAX,
                };
            }
        }
        true
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        matches!(
            self.slots.get(id.slot as usize),
            Some(Slot::Occupied { generation }) if *generation == id.generation
        )
    }

    pub fn alive_count(&self) -> usize {
        self.live
    }

    /// Live handles in slot order.
    pub fn iter_alive(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0u32..).zip(&self.slots).filter_map(|(slot, entry)| match *entry {
            Slot::Occupied { generation } => Some(EntityId { slot, generation }),
            Slot::Vacant { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_slots_are_sequential() {
        let mut entities = EntityAllocator::new();
        let spawned: Vec<u32> = (0..5).map(|_| entities.allocate().index()).collect();
        assert_eq!(spawned, [0, 1, 2, 3, 4]);
        assert_eq!(entities.alive_count(), 5);
    }

    #[test]
    fn most_recently_freed_slot_is_reused_first() {
        let mut entities = EntityAllocator::new();
        let a = entities.allocate();
        let b = entities.allocate();
        entities.deallocate(a);
        entities.deallocate(b);

        let c = entities.allocate();
        assert_eq!((c.index(), c.generation()), (b.index(), 1));
        assert!(!entities.is_alive(b));
        assert!(entities.is_alive(c));
    }

    #[test]
    fn stale_and_unknown_handles_do_not_free() {
        let mut entities = EntityAllocator::new();
        let e = entities.allocate();
        assert!(entities.deallocate(e));
        assert!(!entities.deallocate(e));
        assert!(!entities.deallocate(EntityId { slot: 40, generation: 0 }));
        assert_eq!(entities.alive_count(), 0);
    }

    #[test]
    fn exhausted_slot_is_retired() {
        let mut entities = EntityAllocator::new();
        entities.slots.push(Slot::Occupied {
            generation: u32::MAX,
        });
        entities.live = 1;
        let last = EntityId {
            slot: 0,
            generation: u32::MAX,
        };

        assert!(entities.deallocate(last));
        let next = entities.allocate();
        assert_eq!(next.index(), 1);
        assert!(!entities.is_alive(last));
    }

    #[test]
    fn iter_alive_skips_vacant_slots() {
        let mut entities = EntityAllocator::new();
        let a = entities.allocate();
        let b = entities.allocate();
        let c = entities.allocate();
        entities.deallocate(b);
        assert_eq!(entities.iter_alive().collect::<Vec<_>>(), [a, c]);
    }

    #[test]
    fn handles_order_by_slot_then_generation() {
        let older = EntityId { slot: 1, generation: 3 };
        let newer = EntityId { slot: 2, generation: 0 };
        assert!(older < newer);
        assert_eq!(older.to_string(), "#1.3");
    }
}
