//! Trade execution types
//!
//! A trade is the atomic exchange between a resting maker and an incoming
//! taker, always priced at the maker's level.

use crate::ids::{OrderId, TradeId};
use crate::numeric::{Price, Qty};
use crate::order::Side;
use serde::{Deserialize, Serialize};

/// A single execution between two orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub buy_id: OrderId,
    pub sell_id: OrderId,
    /// Execution price: the resting (maker) order's price
    pub price: Price,
    pub qty: Qty,
    /// Engine timestamp of the event that produced this trade
    pub timestamp: u64,
    /// Which side crossed the spread
    pub taker_side: Side,
}

impl Trade {
    /// The maker's order id (the side that was resting)
    pub fn maker_id(&self) -> OrderId {
        match self.taker_side {
            Side::Buy => self.sell_id,
            Side::Sell => self.buy_id,
        }
    }

    /// The taker's order id (the side that crossed)
    pub fn taker_id(&self) -> OrderId {
        match self.taker_side {
            Side::Buy => self.buy_id,
            Side::Sell => self.sell_id,
        }
    }
}
