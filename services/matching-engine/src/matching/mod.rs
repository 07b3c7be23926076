//! Price-time priority matching
//!
//! The matcher applies one accepted order against the opposite ladder:
//! walk the best levels while the taker's limit allows, consume each
//! level's FIFO from the head, then rest or drop the residual. Iceberg
//! makers whose display drains are replenished and re-queued at the tail
//! of their level, forfeiting time priority. After the taker completes,
//! any stops whose triggers the new last trade price satisfies are
//! released and matched the same way.

pub mod crossing;
pub mod executor;

pub use executor::MatchExecutor;

use crate::book::{Book, StopBook};
use crate::events::EngineEvent;
use types::{Order, OrderKind, Price, Side};

/// One matching pass: borrows the book, the executor, and the event buffer
/// the engine collects outcomes into
pub(crate) struct Matcher<'a> {
    pub book: &'a mut Book,
    pub executor: &'a mut MatchExecutor,
    pub events: &'a mut Vec<EngineEvent>,
}

impl Matcher<'_> {
    /// Full cycle for an accepted order: sweep, settle the residual, then
    /// drain any stops the resulting trades triggered
    pub fn run(&mut self, taker: Order, timestamp: u64) {
        self.execute(taker, timestamp);
        self.drain_stops(timestamp);
    }

    /// Sweep and residual handling for one order, without the stop drain
    fn execute(&mut self, mut taker: Order, timestamp: u64) {
        match taker.side {
            Side::Buy => self.sweep_asks(&mut taker, timestamp),
            Side::Sell => self.sweep_bids(&mut taker, timestamp),
        }
        self.settle_residual(taker, timestamp);
    }

    /// Match a buy taker against the ask ladder, best (lowest) level first
    fn sweep_asks(&mut self, taker: &mut Order, timestamp: u64) {
        while !taker.is_filled() {
            let Some(best) = self.book.asks.best_price() else {
                break;
            };
            if !crossing::crosses(taker.side, taker.price, best) {
                break;
            }
            self.consume_ask_level(best, taker, timestamp);
            self.book.asks.drop_if_empty(best);
        }
    }

    /// Match a sell taker against the bid ladder, best (highest) level first
    fn sweep_bids(&mut self, taker: &mut Order, timestamp: u64) {
        while !taker.is_filled() {
            let Some(best) = self.book.bids.best_price() else {
                break;
            };
            if !crossing::crosses(taker.side, taker.price, best) {
                break;
            }
            self.consume_bid_level(best, taker, timestamp);
            self.book.bids.drop_if_empty(best);
        }
    }

    fn consume_ask_level(&mut self, price: Price, taker: &mut Order, timestamp: u64) {
        loop {
            if taker.is_filled() {
                return;
            }
            let Book {
                arena, asks, index, ..
            } = &mut *self.book;
            let Some(level) = asks.level_mut(price) else {
                return;
            };
            let Some(maker_handle) = level.front() else {
                return;
            };

            let maker = arena.order_mut(maker_handle);
            let n = taker.remaining.min(maker.visible_qty());
            maker.fill(n);
            let maker_id = maker.order_id;
            let maker_filled = maker.is_filled();
            let display_drained = maker.kind == OrderKind::Iceberg
                && maker.display_now.is_zero()
                && !maker.hidden.is_zero();

            taker.fill(n);
            level.sub_visible(n);

            if maker_filled {
                level.pop_front(arena);
                index.remove(maker_id);
                arena.remove(maker_handle);
            } else if display_drained {
                // Replenished display re-enters as a fresh arrival: tail
                // of the FIFO, time priority forfeited
                level.pop_front(arena);
                arena.order_mut(maker_handle).replenish();
                level.push_back(arena, maker_handle);
            }

            let trade = self.executor.execute_trade(
                taker.side,
                taker.order_id,
                maker_id,
                price,
                n,
                timestamp,
            );
            self.events.push(EngineEvent::TradeExecuted(trade));
        }
    }

    fn consume_bid_level(&mut self, price: Price, taker: &mut Order, timestamp: u64) {
        loop {
            if taker.is_filled() {
                return;
            }
            let Book {
                arena, bids, index, ..
            } = &mut *self.book;
            let Some(level) = bids.level_mut(price) else {
                return;
            };
            let Some(maker_handle) = level.front() else {
                return;
            };

            let maker = arena.order_mut(maker_handle);
            let n = taker.remaining.min(maker.visible_qty());
            maker.fill(n);
            let maker_id = maker.order_id;
            let maker_filled = maker.is_filled();
            let display_drained = maker.kind == OrderKind::Iceberg
                && maker.display_now.is_zero()
                && !maker.hidden.is_zero();

            taker.fill(n);
            level.sub_visible(n);

            if maker_filled {
                level.pop_front(arena);
                index.remove(maker_id);
                arena.remove(maker_handle);
            } else if display_drained {
                level.pop_front(arena);
                arena.order_mut(maker_handle).replenish();
                level.push_back(arena, maker_handle);
            }

            let trade = self.executor.execute_trade(
                taker.side,
                taker.order_id,
                maker_id,
                price,
                n,
                timestamp,
            );
            self.events.push(EngineEvent::TradeExecuted(trade));
        }
    }

    /// Post-sweep residual policy: limits and icebergs rest, market
    /// residuals are dropped with a notice
    fn settle_residual(&mut self, mut taker: Order, _timestamp: u64) {
        if taker.is_filled() {
            return;
        }
        match taker.kind {
            OrderKind::Limit | OrderKind::Iceberg => {
                taker.refresh_display();
                let order_id = taker.order_id;
                let side = taker.side;
                let visible_qty = taker.visible_qty();
                let Some(price) = taker.price else {
                    return;
                };
                self.book.rest(taker);
                self.events.push(EngineEvent::OrderRested {
                    order_id,
                    side,
                    price,
                    visible_qty,
                });
            }
            OrderKind::Market => {
                self.events.push(EngineEvent::MarketUnfilled {
                    order_id: taker.order_id,
                    unfilled_qty: taker.remaining,
                });
            }
            // Stops are converted before they reach the matcher
            OrderKind::StopLoss => {}
        }
    }

    /// Release every stop whose trigger the current last trade price
    /// satisfies, most conservative trigger first, re-running the match
    /// for each conversion. Triggered orders can trade and move the last
    /// trade price, so eligibility is re-read every iteration.
    fn drain_stops(&mut self, timestamp: u64) {
        loop {
            let Some(last_trade) = self.executor.last_trade_price() else {
                return;
            };
            let Some(stop) = self.book.stops.pop_triggered(last_trade) else {
                return;
            };
            self.events.push(EngineEvent::StopTriggered {
                order_id: stop.order_id,
            });
            let converted = convert_stop(stop, timestamp);
            self.execute(converted, timestamp);
        }
    }
}

/// Turn a triggered stop into its limit or market equivalent, keeping its
/// id and residual quantity
pub(crate) fn convert_stop(stop: Order, timestamp: u64) -> Order {
    let mut converted = match stop.limit_price {
        Some(limit) => Order::limit(stop.order_id, timestamp, stop.side, limit, stop.remaining),
        None => Order::market(stop.order_id, timestamp, stop.side, stop.remaining),
    };
    converted.triggered = true;
    converted
}

/// Whether a stop would fire at the given last trade price
pub(crate) fn stop_would_trigger(side: Side, trigger: Price, last_trade: Price) -> bool {
    StopBook::is_triggered(side, trigger, last_trade)
}
