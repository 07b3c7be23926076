//! Order lifecycle types
//!
//! An `Order` couples immutable identity (id, side, kind, original size)
//! with the mutable residual the matcher works on. Iceberg orders carry a
//! visible/hidden split, stop-loss orders a trigger threshold; both are
//! plain fields so the matcher never allocates while reshaping an order.

use crate::ids::OrderId;
use crate::numeric::{Price, Qty};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

/// Execution style of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Execute at the limit price or better, rest the remainder
    Limit,
    /// Execute immediately against whatever liquidity exists
    Market,
    /// Limit order showing only a display slice; the reserve is revealed
    /// slice by slice, each slice losing time priority
    Iceberg,
    /// Inert until the last trade price crosses the trigger, then converts
    /// to its limit or market equivalent
    StopLoss,
}

/// A single order: identity plus mutable residual state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    /// Engine-assigned at the serialization point; strictly monotonic and
    /// the FIFO tie-break within a price level
    pub timestamp: u64,
    /// None for market orders (and for stops until converted)
    pub price: Option<Price>,
    /// Original quantity
    pub qty: Qty,
    /// Unfilled quantity
    pub remaining: Qty,
    pub side: Side,
    pub kind: OrderKind,

    // Iceberg state (zero for other kinds)
    /// Configured peak size of each visible slice
    pub display_total: Qty,
    /// Currently visible fraction of `remaining`
    pub display_now: Qty,
    /// Off-book reserve; `display_now + hidden == remaining`
    pub hidden: Qty,

    // Stop-loss state
    pub trigger_price: Option<Price>,
    /// Price of the limit order the stop converts to; None converts to market
    pub limit_price: Option<Price>,
    pub triggered: bool,
}

impl Order {
    /// Create a limit order
    pub fn limit(order_id: OrderId, timestamp: u64, side: Side, price: Price, qty: Qty) -> Self {
        Self {
            order_id,
            timestamp,
            price: Some(price),
            qty,
            remaining: qty,
            side,
            kind: OrderKind::Limit,
            display_total: Qty::zero(),
            display_now: Qty::zero(),
            hidden: Qty::zero(),
            trigger_price: None,
            limit_price: None,
            triggered: false,
        }
    }

    /// Create a market order
    pub fn market(order_id: OrderId, timestamp: u64, side: Side, qty: Qty) -> Self {
        Self {
            order_id,
            timestamp,
            price: None,
            qty,
            remaining: qty,
            side,
            kind: OrderKind::Market,
            display_total: Qty::zero(),
            display_now: Qty::zero(),
            hidden: Qty::zero(),
            trigger_price: None,
            limit_price: None,
            triggered: false,
        }
    }

    /// Create an iceberg limit order with an initial visible slice
    pub fn iceberg(
        order_id: OrderId,
        timestamp: u64,
        side: Side,
        price: Price,
        total_qty: Qty,
        display_qty: Qty,
    ) -> Self {
        let display_now = display_qty.min(total_qty);
        Self {
            order_id,
            timestamp,
            price: Some(price),
            qty: total_qty,
            remaining: total_qty,
            side,
            kind: OrderKind::Iceberg,
            display_total: display_qty,
            display_now,
            hidden: total_qty - display_now,
            trigger_price: None,
            limit_price: None,
            triggered: false,
        }
    }

    /// Create an untriggered stop-loss order
    pub fn stop(
        order_id: OrderId,
        timestamp: u64,
        side: Side,
        trigger_price: Price,
        limit_price: Option<Price>,
        qty: Qty,
    ) -> Self {
        Self {
            order_id,
            timestamp,
            price: None,
            qty,
            remaining: qty,
            side,
            kind: OrderKind::StopLoss,
            display_total: Qty::zero(),
            display_now: Qty::zero(),
            hidden: Qty::zero(),
            trigger_price: Some(trigger_price),
            limit_price,
            triggered: false,
        }
    }

    /// Quantity a counterparty can see and hit: the display slice for
    /// icebergs, the full residual otherwise
    pub fn visible_qty(&self) -> Qty {
        match self.kind {
            OrderKind::Iceberg => self.display_now,
            _ => self.remaining,
        }
    }

    /// Reduce the residual by `min(n, remaining)`, returning the amount
    /// actually consumed. Iceberg fills come out of the display slice.
    pub fn fill(&mut self, n: Qty) -> Qty {
        let filled = n.min(self.remaining);
        self.remaining -= filled;
        if self.kind == OrderKind::Iceberg {
            self.display_now = self.display_now.saturating_sub(filled);
            self.hidden = self.remaining - self.display_now;
        }
        filled
    }

    /// Move the next slice of hidden quantity into the display
    ///
    /// Only acts when the display is empty and reserve remains; a no-op
    /// otherwise, so calling it after the reserve drains is harmless.
    pub fn replenish(&mut self) {
        if self.kind != OrderKind::Iceberg || !self.display_now.is_zero() || self.hidden.is_zero()
        {
            return;
        }
        self.display_now = self.display_total.min(self.hidden);
        self.hidden = self.remaining - self.display_now;
    }

    /// Recompute the visible slice from the current residual
    ///
    /// Used when a partially filled iceberg taker goes to rest: whatever
    /// survived the sweep shows a fresh slice of up to `display_total`.
    pub fn refresh_display(&mut self) {
        if self.kind == OrderKind::Iceberg {
            self.display_now = self.display_total.min(self.remaining);
            self.hidden = self.remaining - self.display_now;
        }
    }

    pub fn is_filled(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Residual bookkeeping invariant
    pub fn check_invariant(&self) -> bool {
        self.remaining <= self.qty
            && (self.kind != OrderKind::Iceberg || self.display_now + self.hidden == self.remaining)
    }
}
