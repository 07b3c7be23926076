//! Event records on both edges of the engine
//!
//! Inbound: `OrderEvent`, the flat queue record producers enqueue. The
//! engine worker is the only reader; ids are minted producer-side so the
//! caller has them before the event is applied.
//!
//! Outbound: `EngineEvent`, the outcome stream emitted while applying an
//! event: trades in execution order plus acknowledgements, residual
//! notices, and post-acceptance rejections.

use serde::{Deserialize, Serialize};
use types::{EngineError, OrderId, Price, Qty, Side, Trade};

/// Kind of a queued submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Limit,
    Market,
    Cancel,
    Modify,
    Iceberg,
    Stop,
}

/// Internal queue record
///
/// A fixed flat layout. `aux1`/`aux2` carry the kind-specific extras:
/// the display quantity for icebergs, the limit price for stops, and the
/// replacement price/quantity for modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub kind: EventKind,
    pub order_id: OrderId,
    pub side: Side,
    /// Limit/iceberg price, or the stop trigger; 0 when absent
    pub price: i64,
    pub qty: u64,
    /// Iceberg: display quantity. Stop: limit price (0 = market). Modify: new price.
    pub aux1: i64,
    /// Modify: new quantity. Unused otherwise.
    pub aux2: u64,
    /// Wall clock observed by the producer at enqueue; informational only
    pub producer_timestamp: u64,
}

impl OrderEvent {
    pub fn limit(order_id: OrderId, side: Side, price: Price, qty: Qty, now: u64) -> Self {
        Self {
            kind: EventKind::Limit,
            order_id,
            side,
            price: price.ticks(),
            qty: qty.as_u64(),
            aux1: 0,
            aux2: 0,
            producer_timestamp: now,
        }
    }

    pub fn market(order_id: OrderId, side: Side, qty: Qty, now: u64) -> Self {
        Self {
            kind: EventKind::Market,
            order_id,
            side,
            price: 0,
            qty: qty.as_u64(),
            aux1: 0,
            aux2: 0,
            producer_timestamp: now,
        }
    }

    pub fn iceberg(
        order_id: OrderId,
        side: Side,
        price: Price,
        total_qty: Qty,
        display_qty: Qty,
        now: u64,
    ) -> Self {
        Self {
            kind: EventKind::Iceberg,
            order_id,
            side,
            price: price.ticks(),
            qty: total_qty.as_u64(),
            aux1: display_qty.as_u64() as i64,
            aux2: 0,
            producer_timestamp: now,
        }
    }

    pub fn stop(
        order_id: OrderId,
        side: Side,
        trigger_price: Price,
        limit_price: Option<Price>,
        qty: Qty,
        now: u64,
    ) -> Self {
        Self {
            kind: EventKind::Stop,
            order_id,
            side,
            price: trigger_price.ticks(),
            qty: qty.as_u64(),
            aux1: limit_price.map_or(0, |p| p.ticks()),
            aux2: 0,
            producer_timestamp: now,
        }
    }

    pub fn cancel(order_id: OrderId, now: u64) -> Self {
        Self {
            kind: EventKind::Cancel,
            order_id,
            // Side is not known producer-side for cancels; ignored on apply
            side: Side::Buy,
            price: 0,
            qty: 0,
            aux1: 0,
            aux2: 0,
            producer_timestamp: now,
        }
    }

    pub fn modify(order_id: OrderId, new_price: Price, new_qty: Qty, now: u64) -> Self {
        Self {
            kind: EventKind::Modify,
            order_id,
            side: Side::Buy,
            price: 0,
            qty: 0,
            aux1: new_price.ticks(),
            aux2: new_qty.as_u64(),
            producer_timestamp: now,
        }
    }
}

/// Outcome stream record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Two orders crossed
    TradeExecuted(Trade),
    /// Residual of a market order that found no more liquidity; the
    /// residual is dropped, never rested
    MarketUnfilled { order_id: OrderId, unfilled_qty: Qty },
    /// An order (or its residual) went to rest on a ladder
    OrderRested {
        order_id: OrderId,
        side: Side,
        price: Price,
        visible_qty: Qty,
    },
    /// A resting order or pending stop was removed at the caller's request
    OrderCanceled { order_id: OrderId, remaining_qty: Qty },
    /// A resting order was re-priced/re-sized; it lost time priority
    OrderModified {
        order_id: OrderId,
        new_price: Price,
        new_qty: Qty,
    },
    /// A stop crossed its trigger and re-entered as a limit or market order
    StopTriggered { order_id: OrderId },
    /// A queued cancel/modify could not be applied (unknown, already
    /// filled, or already cancelled id)
    CommandRejected {
        order_id: OrderId,
        error: EngineError,
    },
}

impl EngineEvent {
    /// The trade carried by this event, if any
    pub fn as_trade(&self) -> Option<&Trade> {
        match self {
            EngineEvent::TradeExecuted(trade) => Some(trade),
            _ => None,
        }
    }
}
