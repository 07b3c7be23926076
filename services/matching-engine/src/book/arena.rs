//! Slot arena for resting orders
//!
//! Orders live in recycled slots addressed by stable `Handle`s. The ladder
//! FIFOs thread intrusive prev/next links through the slots, and the order
//! index maps id to handle, so neither side ever owns the order or counts
//! references. Released slots return to an internal free list, keeping the
//! hot path away from the allocator once the arena has warmed up.

use types::Order;

/// Stable reference to an occupied arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u32);

impl Handle {
    fn index(self) -> usize {
        self.0 as usize
    }
}

enum Entry {
    Occupied(Slot),
    Vacant { next_free: Option<Handle> },
}

struct Slot {
    order: Order,
    /// Toward the level head (earlier arrivals)
    prev: Option<Handle>,
    /// Toward the level tail (later arrivals)
    next: Option<Handle>,
}

/// Free-list arena of order slots
pub struct OrderArena {
    entries: Vec<Entry>,
    free_head: Option<Handle>,
    live: usize,
}

impl OrderArena {
    /// Create an arena with `capacity` pre-allocated slots
    pub fn with_capacity(capacity: usize) -> Self {
        let mut arena = Self {
            entries: Vec::with_capacity(capacity),
            free_head: None,
            live: 0,
        };
        for _ in 0..capacity {
            let idx = arena.entries.len() as u32;
            arena.entries.push(Entry::Vacant {
                next_free: arena.free_head,
            });
            arena.free_head = Some(Handle(idx));
        }
        arena
    }

    /// Place an order into a recycled slot, growing only when the free
    /// list is exhausted
    pub fn insert(&mut self, order: Order) -> Handle {
        self.live += 1;
        let slot = Slot {
            order,
            prev: None,
            next: None,
        };
        match self.free_head {
            Some(handle) => {
                self.free_head = match self.entries[handle.index()] {
                    Entry::Vacant { next_free } => next_free,
                    Entry::Occupied(_) => panic!("free list points at occupied slot"),
                };
                self.entries[handle.index()] = Entry::Occupied(slot);
                handle
            }
            None => {
                let handle = Handle(self.entries.len() as u32);
                self.entries.push(Entry::Occupied(slot));
                handle
            }
        }
    }

    /// Release a slot back to the free list, returning the order it held
    pub fn remove(&mut self, handle: Handle) -> Order {
        let entry = std::mem::replace(
            &mut self.entries[handle.index()],
            Entry::Vacant {
                next_free: self.free_head,
            },
        );
        match entry {
            Entry::Occupied(slot) => {
                self.free_head = Some(handle);
                self.live -= 1;
                slot.order
            }
            Entry::Vacant { .. } => panic!("remove of vacant arena slot"),
        }
    }

    fn slot(&self, handle: Handle) -> &Slot {
        match &self.entries[handle.index()] {
            Entry::Occupied(slot) => slot,
            Entry::Vacant { .. } => panic!("stale arena handle"),
        }
    }

    fn slot_mut(&mut self, handle: Handle) -> &mut Slot {
        match &mut self.entries[handle.index()] {
            Entry::Occupied(slot) => slot,
            Entry::Vacant { .. } => panic!("stale arena handle"),
        }
    }

    pub fn order(&self, handle: Handle) -> &Order {
        &self.slot(handle).order
    }

    pub fn order_mut(&mut self, handle: Handle) -> &mut Order {
        &mut self.slot_mut(handle).order
    }

    pub fn prev(&self, handle: Handle) -> Option<Handle> {
        self.slot(handle).prev
    }

    pub fn next(&self, handle: Handle) -> Option<Handle> {
        self.slot(handle).next
    }

    pub fn set_prev(&mut self, handle: Handle, prev: Option<Handle>) {
        self.slot_mut(handle).prev = prev;
    }

    pub fn set_next(&mut self, handle: Handle, next: Option<Handle>) {
        self.slot_mut(handle).next = next;
    }

    /// Number of occupied slots
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of slots ready for reuse
    pub fn free_count(&self) -> usize {
        self.entries.len() - self.live
    }

    /// Total slots ever allocated
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}
