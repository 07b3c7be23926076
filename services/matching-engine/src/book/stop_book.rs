//! Resting place for untriggered stop-loss orders
//!
//! Stops are invisible to the ladders: they contribute nothing to quotes or
//! depth until the last trade price crosses their trigger. Buy-stops fire
//! when the last trade rises to or above the trigger, sell-stops when it
//! falls to or below it.
//!
//! Keys sort by `(trigger, order id)` so a drain releases the most
//! conservative trigger first: buy-stops ascending, sell-stops descending,
//! with arrival order breaking ties at the same trigger.

use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use types::{Order, OrderId, Price, Side};

/// Pending stop orders, held off-book until triggered
#[derive(Debug, Default)]
pub struct StopBook {
    /// Fire when last trade >= trigger; drained in ascending trigger order
    buy_stops: BTreeMap<(Price, OrderId), Order>,
    /// Fire when last trade <= trigger; drained in descending trigger order
    sell_stops: BTreeMap<(Reverse<Price>, OrderId), Order>,
    /// Cancel support: id → (side, trigger)
    by_id: FxHashMap<OrderId, (Side, Price)>,
}

impl StopBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rest an untriggered stop. The order must carry a trigger price.
    pub fn insert(&mut self, order: Order) {
        let trigger = match order.trigger_price {
            Some(trigger) => trigger,
            None => return,
        };
        self.by_id.insert(order.order_id, (order.side, trigger));
        match order.side {
            Side::Buy => {
                self.buy_stops.insert((trigger, order.order_id), order);
            }
            Side::Sell => {
                self.sell_stops.insert((Reverse(trigger), order.order_id), order);
            }
        }
    }

    /// Remove a pending stop by id
    pub fn cancel(&mut self, order_id: OrderId) -> Option<Order> {
        let (side, trigger) = self.by_id.remove(&order_id)?;
        match side {
            Side::Buy => self.buy_stops.remove(&(trigger, order_id)),
            Side::Sell => self.sell_stops.remove(&(Reverse(trigger), order_id)),
        }
    }

    /// Whether a stop would fire immediately at the given last trade price
    pub fn is_triggered(side: Side, trigger: Price, last_trade: Price) -> bool {
        match side {
            Side::Buy => last_trade >= trigger,
            Side::Sell => last_trade <= trigger,
        }
    }

    /// Release the next stop eligible at `last_trade`, most conservative
    /// trigger first; buy-stops drain before sell-stops
    pub fn pop_triggered(&mut self, last_trade: Price) -> Option<Order> {
        if let Some(key) = self
            .buy_stops
            .range(..=(last_trade, OrderId::new(u64::MAX)))
            .map(|(key, _)| *key)
            .next()
        {
            let order = self.buy_stops.remove(&key);
            if let Some(order) = &order {
                self.by_id.remove(&order.order_id);
            }
            return order;
        }

        if let Some(key) = self
            .sell_stops
            .range(..=(Reverse(last_trade), OrderId::new(u64::MAX)))
            .map(|(key, _)| *key)
            .next()
        {
            let order = self.sell_stops.remove(&key);
            if let Some(order) = &order {
                self.by_id.remove(&order.order_id);
            }
            return order;
        }

        None
    }

    /// Number of pending stops
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::Qty;

    fn stop(id: u64, side: Side, trigger: i64) -> Order {
        Order::stop(
            OrderId::new(id),
            id,
            side,
            Price::new(trigger),
            Some(Price::new(trigger)),
            Qty::new(5),
        )
    }

    #[test]
    fn test_trigger_conditions() {
        assert!(StopBook::is_triggered(
            Side::Buy,
            Price::new(100),
            Price::new(100)
        ));
        assert!(StopBook::is_triggered(
            Side::Buy,
            Price::new(100),
            Price::new(105)
        ));
        assert!(!StopBook::is_triggered(
            Side::Buy,
            Price::new(100),
            Price::new(99)
        ));

        assert!(StopBook::is_triggered(
            Side::Sell,
            Price::new(98),
            Price::new(98)
        ));
        assert!(StopBook::is_triggered(
            Side::Sell,
            Price::new(98),
            Price::new(90)
        ));
        assert!(!StopBook::is_triggered(
            Side::Sell,
            Price::new(98),
            Price::new(99)
        ));
    }

    #[test]
    fn test_untriggered_stops_stay_put() {
        let mut book = StopBook::new();
        book.insert(stop(1, Side::Sell, 98));
        book.insert(stop(2, Side::Buy, 110));

        assert_eq!(book.pop_triggered(Price::new(100)), None);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_buy_stops_drain_ascending() {
        let mut book = StopBook::new();
        book.insert(stop(1, Side::Buy, 105));
        book.insert(stop(2, Side::Buy, 103));
        book.insert(stop(3, Side::Buy, 104));

        let last = Price::new(105);
        let order = book.pop_triggered(last).unwrap();
        assert_eq!(order.order_id, OrderId::new(2));
        let order = book.pop_triggered(last).unwrap();
        assert_eq!(order.order_id, OrderId::new(3));
        let order = book.pop_triggered(last).unwrap();
        assert_eq!(order.order_id, OrderId::new(1));
        assert!(book.is_empty());
    }

    #[test]
    fn test_sell_stops_drain_descending() {
        let mut book = StopBook::new();
        book.insert(stop(1, Side::Sell, 95));
        book.insert(stop(2, Side::Sell, 98));

        let last = Price::new(95);
        let order = book.pop_triggered(last).unwrap();
        assert_eq!(order.order_id, OrderId::new(2));
        let order = book.pop_triggered(last).unwrap();
        assert_eq!(order.order_id, OrderId::new(1));
    }

    #[test]
    fn test_same_trigger_breaks_by_arrival() {
        let mut book = StopBook::new();
        book.insert(stop(7, Side::Sell, 98));
        book.insert(stop(3, Side::Sell, 98));

        let order = book.pop_triggered(Price::new(98)).unwrap();
        assert_eq!(order.order_id, OrderId::new(3));
    }

    #[test]
    fn test_cancel_pending_stop() {
        let mut book = StopBook::new();
        book.insert(stop(1, Side::Buy, 105));

        let removed = book.cancel(OrderId::new(1)).unwrap();
        assert_eq!(removed.order_id, OrderId::new(1));
        assert!(book.cancel(OrderId::new(1)).is_none());
        assert_eq!(book.pop_triggered(Price::new(200)), None);
    }
}
