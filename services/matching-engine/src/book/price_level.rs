//! Price level: the FIFO of resting orders at one price
//!
//! Orders are maintained in strict arrival order to enforce time priority.
//! The FIFO is an intrusive doubly-linked list threaded through the order
//! arena, so appending, popping the head, and removing an interior order
//! (a cancel) are all O(1), and interior removal never disturbs the
//! relative order of the survivors.
//!
//! The level caches the sum of visible quantities: full residuals for
//! ordinary orders, the display slice for icebergs. Every mutation of a
//! member order's visible quantity must be mirrored here.

use types::Qty;

use super::arena::{Handle, OrderArena};

/// FIFO of order handles at a single price
#[derive(Debug, Default)]
pub struct PriceLevel {
    head: Option<Handle>,
    tail: Option<Handle>,
    len: usize,
    /// Cached sum of `visible_qty()` over every order in the level
    visible_qty: Qty,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail (lowest time priority)
    pub fn push_back(&mut self, arena: &mut OrderArena, handle: Handle) {
        arena.set_prev(handle, self.tail);
        arena.set_next(handle, None);
        match self.tail {
            Some(tail) => arena.set_next(tail, Some(handle)),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
        self.len += 1;
        self.visible_qty += arena.order(handle).visible_qty();
    }

    /// The order with the highest time priority
    pub fn front(&self) -> Option<Handle> {
        self.head
    }

    /// Detach the head of the FIFO
    pub fn pop_front(&mut self, arena: &mut OrderArena) -> Option<Handle> {
        let handle = self.head?;
        self.unlink(arena, handle);
        Some(handle)
    }

    /// Detach an arbitrary member in O(1) via its handle
    ///
    /// The neighbours are re-linked directly, so FIFO order among the
    /// remaining orders is untouched.
    pub fn unlink(&mut self, arena: &mut OrderArena, handle: Handle) {
        let prev = arena.prev(handle);
        let next = arena.next(handle);

        match prev {
            Some(prev) => arena.set_next(prev, next),
            None => self.head = next,
        }
        match next {
            Some(next) => arena.set_prev(next, prev),
            None => self.tail = prev,
        }
        arena.set_prev(handle, None);
        arena.set_next(handle, None);

        self.len -= 1;
        self.visible_qty = self.visible_qty.saturating_sub(arena.order(handle).visible_qty());
    }

    /// Mirror a fill against a member order's visible quantity
    pub fn sub_visible(&mut self, n: Qty) {
        self.visible_qty = self.visible_qty.saturating_sub(n);
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn order_count(&self) -> usize {
        self.len
    }

    /// Aggregate visible quantity at this price
    pub fn visible_qty(&self) -> Qty {
        self.visible_qty
    }

    /// Iterate handles in time-priority order (test and audit use)
    pub fn iter<'a>(&self, arena: &'a OrderArena) -> LevelIter<'a> {
        LevelIter {
            arena,
            cursor: self.head,
        }
    }
}

/// Head-to-tail traversal of a level
pub struct LevelIter<'a> {
    arena: &'a OrderArena,
    cursor: Option<Handle>,
}

impl Iterator for LevelIter<'_> {
    type Item = Handle;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        self.cursor = self.arena.next(handle);
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Order, OrderId, Price, Qty, Side};

    fn rest(arena: &mut OrderArena, level: &mut PriceLevel, id: u64, qty: u64) -> Handle {
        let order = Order::limit(
            OrderId::new(id),
            id,
            Side::Sell,
            Price::new(100),
            Qty::new(qty),
        );
        let handle = arena.insert(order);
        level.push_back(arena, handle);
        handle
    }

    fn ids(level: &PriceLevel, arena: &OrderArena) -> Vec<u64> {
        level
            .iter(arena)
            .map(|h| arena.order(h).order_id.as_u64())
            .collect()
    }

    #[test]
    fn test_fifo_order_preserved() {
        let mut arena = OrderArena::with_capacity(8);
        let mut level = PriceLevel::new();

        rest(&mut arena, &mut level, 1, 5);
        rest(&mut arena, &mut level, 2, 3);
        rest(&mut arena, &mut level, 3, 2);

        assert_eq!(ids(&level, &arena), vec![1, 2, 3]);
        assert_eq!(level.visible_qty(), Qty::new(10));
        assert_eq!(level.order_count(), 3);
    }

    #[test]
    fn test_pop_front_takes_earliest() {
        let mut arena = OrderArena::with_capacity(8);
        let mut level = PriceLevel::new();

        let h1 = rest(&mut arena, &mut level, 1, 5);
        rest(&mut arena, &mut level, 2, 3);

        assert_eq!(level.pop_front(&mut arena), Some(h1));
        assert_eq!(ids(&level, &arena), vec![2]);
        assert_eq!(level.visible_qty(), Qty::new(3));
    }

    #[test]
    fn test_interior_unlink_keeps_order() {
        let mut arena = OrderArena::with_capacity(8);
        let mut level = PriceLevel::new();

        rest(&mut arena, &mut level, 1, 5);
        let h2 = rest(&mut arena, &mut level, 2, 3);
        rest(&mut arena, &mut level, 3, 2);

        level.unlink(&mut arena, h2);

        assert_eq!(ids(&level, &arena), vec![1, 3]);
        assert_eq!(level.visible_qty(), Qty::new(7));
        assert_eq!(level.order_count(), 2);
    }

    #[test]
    fn test_unlink_tail_and_head() {
        let mut arena = OrderArena::with_capacity(8);
        let mut level = PriceLevel::new();

        let h1 = rest(&mut arena, &mut level, 1, 5);
        let h2 = rest(&mut arena, &mut level, 2, 3);

        level.unlink(&mut arena, h2);
        assert_eq!(ids(&level, &arena), vec![1]);

        level.unlink(&mut arena, h1);
        assert!(level.is_empty());
        assert_eq!(level.visible_qty(), Qty::zero());
    }

    #[test]
    fn test_reappend_after_pop_goes_to_tail() {
        let mut arena = OrderArena::with_capacity(8);
        let mut level = PriceLevel::new();

        let h1 = rest(&mut arena, &mut level, 1, 5);
        rest(&mut arena, &mut level, 2, 3);

        level.pop_front(&mut arena);
        level.push_back(&mut arena, h1);

        assert_eq!(ids(&level, &arena), vec![2, 1]);
    }
}
