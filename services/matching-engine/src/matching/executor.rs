//! Trade execution
//!
//! The executor is the single mint for trade ids, the keeper of the last
//! trade price the stop book watches, and the bounded in-memory trade
//! history kept for inspection (not durable).

use std::collections::VecDeque;
use tracing::debug;
use types::{IdSequence, OrderId, Price, Qty, Side, Trade, TradeId};

/// Builds trades and tracks execution state across events
pub struct MatchExecutor {
    trade_ids: IdSequence,
    last_trade_price: Option<Price>,
    history: VecDeque<Trade>,
    history_limit: usize,
    executed: u64,
}

impl MatchExecutor {
    /// Create an executor retaining at most `history_limit` trades
    pub fn new(history_limit: usize) -> Self {
        Self {
            trade_ids: IdSequence::new(),
            last_trade_price: None,
            history: VecDeque::new(),
            history_limit,
            executed: 0,
        }
    }

    /// Record an execution between a taker and a resting maker
    ///
    /// The price is always the maker's level. Updates the last trade price
    /// and appends to the bounded history.
    pub fn execute_trade(
        &mut self,
        taker_side: Side,
        taker_id: OrderId,
        maker_id: OrderId,
        price: Price,
        qty: Qty,
        timestamp: u64,
    ) -> Trade {
        let (buy_id, sell_id) = match taker_side {
            Side::Buy => (taker_id, maker_id),
            Side::Sell => (maker_id, taker_id),
        };

        let trade = Trade {
            trade_id: TradeId::new(self.trade_ids.next_id()),
            buy_id,
            sell_id,
            price,
            qty,
            timestamp,
            taker_side,
        };

        self.last_trade_price = Some(price);
        self.executed += 1;
        if self.history.len() == self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(trade);

        debug!(
            trade_id = trade.trade_id.as_u64(),
            buy = buy_id.as_u64(),
            sell = sell_id.as_u64(),
            price = price.ticks(),
            qty = qty.as_u64(),
            "trade executed"
        );

        trade
    }

    /// Price of the most recent trade, if any has ever executed
    pub fn last_trade_price(&self) -> Option<Price> {
        self.last_trade_price
    }

    /// Retained trade history, oldest first
    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.history.iter()
    }

    /// Total trades ever executed (the history may retain fewer)
    pub fn trade_count(&self) -> u64 {
        self.executed
    }
}
