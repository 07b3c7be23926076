//! Order book infrastructure
//!
//! The book is a dual ladder over one arena: bids and asks hold price
//! levels whose FIFOs are intrusive lists through arena slots, the order
//! index maps ids to slots for O(1) cancels, and the stop book holds
//! untriggered stop orders off to the side.

pub mod arena;
pub mod ask_book;
pub mod bid_book;
pub mod order_index;
pub mod price_level;
pub mod stop_book;

pub use arena::{Handle, OrderArena};
pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use order_index::OrderIndex;
pub use price_level::PriceLevel;
pub use stop_book::StopBook;

use types::{Order, OrderId, Price, Qty, Side};

/// All resting state of one market: arena, both ladders, index, stops
pub struct Book {
    pub(crate) arena: OrderArena,
    pub(crate) bids: BidBook,
    pub(crate) asks: AskBook,
    pub(crate) index: OrderIndex,
    pub(crate) stops: StopBook,
}

impl Book {
    /// Create a book with `capacity` pre-allocated order slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: OrderArena::with_capacity(capacity),
            bids: BidBook::new(),
            asks: AskBook::new(),
            index: OrderIndex::new(),
            stops: StopBook::new(),
        }
    }

    /// Rest an order at the tail of its price level and register it in the
    /// index. The order must carry a price.
    pub(crate) fn rest(&mut self, order: Order) -> Option<Handle> {
        let order_id = order.order_id;
        let side = order.side;
        let price = order.price?;

        let handle = self.arena.insert(order);
        match side {
            Side::Buy => self.bids.insert(&mut self.arena, price, handle),
            Side::Sell => self.asks.insert(&mut self.arena, price, handle),
        }
        self.index.insert(order_id, handle);
        Some(handle)
    }

    /// Unlink a resting order from its ladder and release its slot
    pub(crate) fn remove_resting(&mut self, order_id: OrderId) -> Option<Order> {
        let handle = self.index.get(order_id)?;
        let (side, price) = {
            let order = self.arena.order(handle);
            (order.side, order.price?)
        };
        self.index.remove(order_id);
        match side {
            Side::Buy => self.bids.remove(&mut self.arena, price, handle),
            Side::Sell => self.asks.remove(&mut self.arena, price, handle),
        };
        Some(self.arena.remove(handle))
    }

    /// Highest resting buy price
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    /// Lowest resting sell price
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// `best_ask - best_bid` in ticks, when both sides are quoted
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.spread_to(bid)),
            _ => None,
        }
    }

    /// Number of orders resting on the ladders (stops excluded)
    pub fn active_count(&self) -> usize {
        self.index.len()
    }

    /// Audit every structural invariant the book promises at rest: ladders
    /// hold no empty level, cached aggregates match their members, the
    /// index points at slots holding the ids it maps, and the book is not
    /// crossed
    pub fn check_consistency(&self) -> bool {
        let ladders_ok =
            self.bids.check_levels(&self.arena) && self.asks.check_levels(&self.arena);

        let index_ok = self
            .index
            .iter()
            .all(|(order_id, handle)| self.arena.order(handle).order_id == order_id);

        let uncrossed = match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid < ask,
            _ => true,
        };

        ladders_ok && index_ok && uncrossed && self.index.len() == self.arena.live_count()
    }

    /// Sum of visible quantity on a side (audit use)
    pub fn visible_on(&self, side: Side) -> Qty {
        let snapshot = match side {
            Side::Buy => self.bids.depth_snapshot(usize::MAX),
            Side::Sell => self.asks.depth_snapshot(usize::MAX),
        };
        snapshot
            .into_iter()
            .fold(Qty::zero(), |acc, (_, qty)| acc + qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(id: u64, side: Side, price: i64, qty: u64) -> Order {
        Order::limit(
            OrderId::new(id),
            id,
            side,
            Price::new(price),
            Qty::new(qty),
        )
    }

    #[test]
    fn test_rest_and_remove() {
        let mut book = Book::with_capacity(8);

        book.rest(limit(1, Side::Buy, 100, 10));
        book.rest(limit(2, Side::Sell, 105, 5));

        assert_eq!(book.best_bid(), Some(Price::new(100)));
        assert_eq!(book.best_ask(), Some(Price::new(105)));
        assert_eq!(book.spread(), Some(5));
        assert_eq!(book.active_count(), 2);
        assert!(book.check_consistency());

        let removed = book.remove_resting(OrderId::new(1)).unwrap();
        assert_eq!(removed.order_id, OrderId::new(1));
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.active_count(), 1);
        assert!(book.check_consistency());
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut book = Book::with_capacity(4);
        assert!(book.remove_resting(OrderId::new(99)).is_none());
    }

    #[test]
    fn test_visible_on_side() {
        let mut book = Book::with_capacity(8);
        book.rest(limit(1, Side::Buy, 100, 10));
        book.rest(limit(2, Side::Buy, 99, 7));
        assert_eq!(book.visible_on(Side::Buy), Qty::new(17));
        assert_eq!(book.visible_on(Side::Sell), Qty::zero());
    }
}
