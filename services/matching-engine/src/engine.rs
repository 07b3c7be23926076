//! Matching engine core
//!
//! `MatchingEngine` is the single-threaded heart: it owns the book and the
//! executor, mints ids and strictly monotonic timestamps, validates
//! arguments, and applies one event at a time. It can be driven directly
//! (embedded, tests) or from the queue by the concurrent front-end, which
//! hands it pre-minted ids through [`apply`](MatchingEngine::apply).

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use types::{EngineError, IdSequence, Order, OrderId, Price, Qty, Side, Trade};

use crate::book::Book;
use crate::events::{EngineEvent, EventKind, OrderEvent};
use crate::matching::{convert_stop, stop_would_trigger, MatchExecutor, Matcher};

/// Tunables for the engine and its worker
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Order slots pre-allocated in the arena
    pub arena_capacity: usize,
    /// Trades retained in the in-memory history
    pub trade_history_limit: usize,
    /// How long the worker parks when the queue is empty
    pub idle_park: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            arena_capacity: 1024,
            trade_history_limit: 1 << 16,
            idle_park: Duration::from_micros(10),
        }
    }
}

/// Top-of-book depth for both sides, best levels first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthSnapshot {
    pub bids: Vec<(Price, Qty)>,
    pub asks: Vec<(Price, Qty)>,
}

/// Point-in-time counters for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub active_orders: usize,
    pub pending_stops: usize,
    pub bid_levels: usize,
    pub ask_levels: usize,
    pub trade_count: u64,
    pub arena_free: usize,
    pub arena_capacity: usize,
}

/// Single-writer order book engine
pub struct MatchingEngine {
    book: Book,
    executor: MatchExecutor,
    order_ids: IdSequence,
    /// Last stamped timestamp; the next stamp is always strictly larger
    clock: u64,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            book: Book::with_capacity(config.arena_capacity),
            executor: MatchExecutor::new(config.trade_history_limit),
            order_ids: IdSequence::new(),
            clock: 0,
        }
    }

    /// Strictly monotonic timestamp, assigned at the serialization point
    fn stamp(&mut self) -> u64 {
        self.clock = now_nanos().max(self.clock + 1);
        self.clock
    }

    fn next_order_id(&mut self) -> OrderId {
        OrderId::new(self.order_ids.next_id())
    }

    fn run_matcher(&mut self, taker: Order, timestamp: u64) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        Matcher {
            book: &mut self.book,
            executor: &mut self.executor,
            events: &mut events,
        }
        .run(taker, timestamp);
        events
    }

    /// Submit a limit order; returns its id and the outcomes in execution
    /// order (trades first, then the rest notice if a residual rested)
    pub fn submit_limit(
        &mut self,
        side: Side,
        price: i64,
        qty: u64,
    ) -> Result<(OrderId, Vec<EngineEvent>), EngineError> {
        let (price, qty) = validate_limit_args(price, qty)?;
        let order_id = self.next_order_id();
        let timestamp = self.stamp();
        debug!(id = order_id.as_u64(), ?side, price = price.ticks(), qty = qty.as_u64(), "submit limit");
        let order = Order::limit(order_id, timestamp, side, price, qty);
        Ok((order_id, self.run_matcher(order, timestamp)))
    }

    /// Submit a market order; any residual is dropped with a
    /// `MarketUnfilled` outcome, never rested
    pub fn submit_market(
        &mut self,
        side: Side,
        qty: u64,
    ) -> Result<(OrderId, Vec<EngineEvent>), EngineError> {
        let qty = Qty::try_new(qty).ok_or_else(|| EngineError::invalid("quantity must be positive"))?;
        let order_id = self.next_order_id();
        let timestamp = self.stamp();
        debug!(id = order_id.as_u64(), ?side, qty = qty.as_u64(), "submit market");
        let order = Order::market(order_id, timestamp, side, qty);
        Ok((order_id, self.run_matcher(order, timestamp)))
    }

    /// Submit an iceberg limit order showing at most `display_qty` at a time
    pub fn submit_iceberg(
        &mut self,
        side: Side,
        price: i64,
        total_qty: u64,
        display_qty: u64,
    ) -> Result<(OrderId, Vec<EngineEvent>), EngineError> {
        let (price, total_qty, display_qty) = validate_iceberg_args(price, total_qty, display_qty)?;
        let order_id = self.next_order_id();
        let timestamp = self.stamp();
        let order = Order::iceberg(order_id, timestamp, side, price, total_qty, display_qty);
        Ok((order_id, self.run_matcher(order, timestamp)))
    }

    /// Submit a stop-loss order; `limit_price` of 0 converts to a market
    /// order on trigger. Fires immediately if the last trade price already
    /// satisfies the trigger.
    pub fn submit_stop(
        &mut self,
        side: Side,
        trigger_price: i64,
        limit_price: i64,
        qty: u64,
    ) -> Result<(OrderId, Vec<EngineEvent>), EngineError> {
        let (trigger, limit, qty) = validate_stop_args(trigger_price, limit_price, qty)?;
        let order_id = self.next_order_id();
        let timestamp = self.stamp();
        let order = Order::stop(order_id, timestamp, side, trigger, limit, qty);
        Ok((order_id, self.place_stop(order, timestamp)))
    }

    fn place_stop(&mut self, order: Order, timestamp: u64) -> Vec<EngineEvent> {
        let trigger = match order.trigger_price {
            Some(trigger) => trigger,
            None => return Vec::new(),
        };
        if let Some(last_trade) = self.executor.last_trade_price() {
            if stop_would_trigger(order.side, trigger, last_trade) {
                let mut events = vec![EngineEvent::StopTriggered {
                    order_id: order.order_id,
                }];
                let converted = convert_stop(order, timestamp);
                events.extend(self.run_matcher(converted, timestamp));
                return events;
            }
        }
        self.book.stops.insert(order);
        Vec::new()
    }

    /// Cancel a resting order or pending stop. Idempotent: a second cancel
    /// of the same id returns false and changes nothing.
    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        self.cancel_returning(order_id).is_some()
    }

    /// Cancel, reporting the remaining quantity that was withdrawn
    pub(crate) fn cancel_returning(&mut self, order_id: OrderId) -> Option<Qty> {
        if let Some(order) = self.book.remove_resting(order_id) {
            debug!(id = order_id.as_u64(), "canceled resting order");
            return Some(order.remaining);
        }
        if let Some(order) = self.book.stops.cancel(order_id) {
            debug!(id = order_id.as_u64(), "canceled pending stop");
            return Some(order.remaining);
        }
        None
    }

    /// Replace a resting order's price and quantity. Equivalent to cancel
    /// plus resubmit: the order keeps its id, gets a fresh timestamp, joins
    /// the tail of its new level, and is re-matched on the way in.
    pub fn modify(
        &mut self,
        order_id: OrderId,
        new_price: i64,
        new_qty: u64,
    ) -> Result<Vec<EngineEvent>, EngineError> {
        let (price, qty) = validate_limit_args(new_price, new_qty)?;
        let old = self
            .book
            .remove_resting(order_id)
            .ok_or(EngineError::not_found(order_id))?;

        let timestamp = self.stamp();
        let mut events = vec![EngineEvent::OrderModified {
            order_id,
            new_price: price,
            new_qty: qty,
        }];
        let order = Order::limit(order_id, timestamp, old.side, price, qty);
        events.extend(self.run_matcher(order, timestamp));
        Ok(events)
    }

    /// Apply a dequeued event. Ids were minted producer-side; arguments
    /// were validated before enqueue, so anything malformed here is logged
    /// and skipped rather than treated as fatal.
    pub fn apply(&mut self, event: &OrderEvent) -> Vec<EngineEvent> {
        match event.kind {
            EventKind::Limit => {
                match (Price::try_new(event.price), Qty::try_new(event.qty)) {
                    (Some(price), Some(qty)) => {
                        let timestamp = self.stamp();
                        let order =
                            Order::limit(event.order_id, timestamp, event.side, price, qty);
                        self.run_matcher(order, timestamp)
                    }
                    _ => self.skip_malformed(event),
                }
            }
            EventKind::Market => match Qty::try_new(event.qty) {
                Some(qty) => {
                    let timestamp = self.stamp();
                    let order = Order::market(event.order_id, timestamp, event.side, qty);
                    self.run_matcher(order, timestamp)
                }
                None => self.skip_malformed(event),
            },
            EventKind::Iceberg => {
                match validate_iceberg_args(event.price, event.qty, event.aux1 as u64) {
                    Ok((price, total_qty, display_qty)) => {
                        let timestamp = self.stamp();
                        let order = Order::iceberg(
                            event.order_id,
                            timestamp,
                            event.side,
                            price,
                            total_qty,
                            display_qty,
                        );
                        self.run_matcher(order, timestamp)
                    }
                    Err(_) => self.skip_malformed(event),
                }
            }
            EventKind::Stop => match validate_stop_args(event.price, event.aux1, event.qty) {
                Ok((trigger, limit, qty)) => {
                    let timestamp = self.stamp();
                    let order =
                        Order::stop(event.order_id, timestamp, event.side, trigger, limit, qty);
                    self.place_stop(order, timestamp)
                }
                Err(_) => self.skip_malformed(event),
            },
            EventKind::Cancel => match self.cancel_returning(event.order_id) {
                Some(remaining_qty) => vec![EngineEvent::OrderCanceled {
                    order_id: event.order_id,
                    remaining_qty,
                }],
                None => vec![EngineEvent::CommandRejected {
                    order_id: event.order_id,
                    error: EngineError::not_found(event.order_id),
                }],
            },
            EventKind::Modify => match self.modify(event.order_id, event.aux1, event.aux2) {
                Ok(events) => events,
                Err(error) => vec![EngineEvent::CommandRejected {
                    order_id: event.order_id,
                    error,
                }],
            },
        }
    }

    fn skip_malformed(&self, event: &OrderEvent) -> Vec<EngineEvent> {
        warn!(?event, "malformed queue event skipped");
        Vec::new()
    }

    // Read queries: consistent by construction, since the engine is the
    // sole mutator and callers hold &self between events.

    pub fn best_bid(&self) -> Option<Price> {
        self.book.best_bid()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.book.best_ask()
    }

    /// `best_ask - best_bid` in ticks, when both sides are quoted
    pub fn spread(&self) -> Option<i64> {
        self.book.spread()
    }

    /// Top `levels` price levels per side, best first
    pub fn depth(&self, levels: usize) -> DepthSnapshot {
        DepthSnapshot {
            bids: self.book.bids.depth_snapshot(levels),
            asks: self.book.asks.depth_snapshot(levels),
        }
    }

    /// Orders resting on the ladders (pending stops excluded)
    pub fn active_count(&self) -> usize {
        self.book.active_count()
    }

    pub fn last_trade_price(&self) -> Option<Price> {
        self.executor.last_trade_price()
    }

    /// Retained trade history, oldest first
    pub fn trades(&self) -> Vec<Trade> {
        self.executor.trades().copied().collect()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            active_orders: self.book.active_count(),
            pending_stops: self.book.stops.len(),
            bid_levels: self.book.bids.level_count(),
            ask_levels: self.book.asks.level_count(),
            trade_count: self.executor.trade_count(),
            arena_free: self.book.arena.free_count(),
            arena_capacity: self.book.arena.capacity(),
        }
    }

    /// Audit the book's structural invariants (test support)
    pub fn check_consistency(&self) -> bool {
        self.book.check_consistency()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

pub(crate) fn validate_limit_args(price: i64, qty: u64) -> Result<(Price, Qty), EngineError> {
    let price = Price::try_new(price).ok_or_else(|| EngineError::invalid("price must be positive"))?;
    let qty = Qty::try_new(qty).ok_or_else(|| EngineError::invalid("quantity must be positive"))?;
    Ok((price, qty))
}

pub(crate) fn validate_iceberg_args(
    price: i64,
    total_qty: u64,
    display_qty: u64,
) -> Result<(Price, Qty, Qty), EngineError> {
    let (price, total_qty) = validate_limit_args(price, total_qty)?;
    let display_qty =
        Qty::try_new(display_qty).ok_or_else(|| EngineError::invalid("display quantity must be positive"))?;
    if display_qty > total_qty {
        return Err(EngineError::invalid(
            "display quantity cannot exceed total quantity",
        ));
    }
    Ok((price, total_qty, display_qty))
}

pub(crate) fn validate_stop_args(
    trigger_price: i64,
    limit_price: i64,
    qty: u64,
) -> Result<(Price, Option<Price>, Qty), EngineError> {
    let trigger =
        Price::try_new(trigger_price).ok_or_else(|| EngineError::invalid("trigger price must be positive"))?;
    let limit = match limit_price {
        0 => None,
        ticks => Some(
            Price::try_new(ticks).ok_or_else(|| EngineError::invalid("limit price cannot be negative"))?,
        ),
    };
    let qty = Qty::try_new(qty).ok_or_else(|| EngineError::invalid("quantity must be positive"))?;
    Ok((trigger, limit, qty))
}
