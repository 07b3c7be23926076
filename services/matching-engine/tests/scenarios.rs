//! End-to-end matching scenarios on the synchronous engine
//!
//! Each test drives the public submit/cancel/modify surface and checks
//! trades, residuals, and book state, then audits the structural
//! invariants the book promises after every event.

use matching_engine::{EngineEvent, MatchingEngine};
use types::{OrderId, Price, Qty, Side, Trade};

fn trades_of(events: &[EngineEvent]) -> Vec<Trade> {
    events.iter().filter_map(|e| e.as_trade().copied()).collect()
}

#[test]
fn simple_cross() {
    let mut engine = MatchingEngine::new();

    let (sell_id, events) = engine.submit_limit(Side::Sell, 101, 10).unwrap();
    assert!(trades_of(&events).is_empty());

    let (buy_id, events) = engine.submit_limit(Side::Buy, 101, 4).unwrap();
    let trades = trades_of(&events);

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].sell_id, sell_id);
    assert_eq!(trades[0].buy_id, buy_id);
    assert_eq!(trades[0].price, Price::new(101));
    assert_eq!(trades[0].qty, Qty::new(4));
    assert_eq!(trades[0].taker_side, Side::Buy);

    // Resting sell keeps its residual, bids are empty
    assert_eq!(engine.best_ask(), Some(Price::new(101)));
    assert_eq!(engine.depth(1).asks, vec![(Price::new(101), Qty::new(6))]);
    assert_eq!(engine.best_bid(), None);
    assert!(engine.check_consistency());
}

#[test]
fn partial_sweep_across_levels() {
    let mut engine = MatchingEngine::new();

    engine.submit_limit(Side::Sell, 100, 5).unwrap();
    engine.submit_limit(Side::Sell, 101, 5).unwrap();

    let (_, events) = engine.submit_market(Side::Buy, 7).unwrap();
    let trades = trades_of(&events);

    assert_eq!(trades.len(), 2);
    assert_eq!((trades[0].price, trades[0].qty), (Price::new(100), Qty::new(5)));
    assert_eq!((trades[1].price, trades[1].qty), (Price::new(101), Qty::new(2)));

    assert_eq!(engine.best_ask(), Some(Price::new(101)));
    assert_eq!(engine.depth(1).asks, vec![(Price::new(101), Qty::new(3))]);
    assert!(engine.check_consistency());
}

#[test]
fn limit_without_cross_rests() {
    let mut engine = MatchingEngine::new();

    engine.submit_limit(Side::Sell, 101, 5).unwrap();
    let (_, events) = engine.submit_limit(Side::Buy, 100, 5).unwrap();

    assert!(trades_of(&events).is_empty());
    assert_eq!(engine.best_bid(), Some(Price::new(100)));
    assert_eq!(engine.depth(1).bids, vec![(Price::new(100), Qty::new(5))]);
    assert_eq!(engine.depth(1).asks, vec![(Price::new(101), Qty::new(5))]);
    assert!(engine.check_consistency());
}

#[test]
fn iceberg_replenish_loses_priority() {
    let mut engine = MatchingEngine::new();

    let (iceberg_id, _) = engine.submit_iceberg(Side::Sell, 100, 10, 3).unwrap();
    let (limit_id, _) = engine.submit_limit(Side::Sell, 100, 4).unwrap();

    // Only the display slice is quoted
    assert_eq!(engine.depth(1).asks, vec![(Price::new(100), Qty::new(7))]);

    // First market buy consumes the iceberg's display; the refill joins
    // the tail, behind the later limit order
    let (_, events) = engine.submit_market(Side::Buy, 3).unwrap();
    let trades = trades_of(&events);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].sell_id, iceberg_id);
    assert_eq!(trades[0].qty, Qty::new(3));

    // Next market buy trades fully against the limit order first
    let (_, events) = engine.submit_market(Side::Buy, 4).unwrap();
    let trades = trades_of(&events);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].sell_id, limit_id);
    assert_eq!(trades[0].qty, Qty::new(4));

    // Iceberg still shows a 3-lot slice with 4 hidden behind it
    assert_eq!(engine.depth(1).asks, vec![(Price::new(100), Qty::new(3))]);
    assert_eq!(engine.active_count(), 1);
    assert!(engine.check_consistency());
}

#[test]
fn iceberg_sweep_through_slices() {
    let mut engine = MatchingEngine::new();

    engine.submit_iceberg(Side::Sell, 100, 10, 3).unwrap();

    // A taker large enough to eat every slice: the display refills
    // mid-sweep, slice after slice, until the reserve is gone
    let (_, events) = engine.submit_market(Side::Buy, 12).unwrap();
    let trades = trades_of(&events);
    let total: u64 = trades.iter().map(|t| t.qty.as_u64()).sum();

    assert_eq!(total, 10);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::MarketUnfilled { unfilled_qty, .. } if *unfilled_qty == Qty::new(2)
    )));
    assert_eq!(engine.active_count(), 0);
    assert!(engine.check_consistency());
}

#[test]
fn stop_trigger_chain() {
    let mut engine = MatchingEngine::new();

    // Establish last trade = 100
    engine.submit_limit(Side::Sell, 100, 1).unwrap();
    engine.submit_market(Side::Buy, 1).unwrap();
    assert_eq!(engine.last_trade_price(), Some(Price::new(100)));

    // Pending sell stop: trigger 98, converts to a 97 limit
    let (stop_id, events) = engine.submit_stop(Side::Sell, 98, 97, 5).unwrap();
    assert!(events.is_empty());
    assert_eq!(engine.stats().pending_stops, 1);

    // Trade at 99: above the trigger, nothing fires
    engine.submit_limit(Side::Sell, 99, 2).unwrap();
    let (_, events) = engine.submit_market(Side::Buy, 2).unwrap();
    assert_eq!(trades_of(&events).len(), 1);
    assert_eq!(engine.last_trade_price(), Some(Price::new(99)));
    assert_eq!(engine.stats().pending_stops, 1);

    // Trade at 97 pushes last trade through the trigger
    engine.submit_limit(Side::Sell, 97, 1).unwrap();
    let (_, events) = engine.submit_market(Side::Buy, 1).unwrap();

    assert!(events.contains(&EngineEvent::StopTriggered { order_id: stop_id }));
    assert_eq!(engine.stats().pending_stops, 0);

    // No bids at or above 97: the converted limit rests
    assert_eq!(engine.best_ask(), Some(Price::new(97)));
    assert_eq!(engine.depth(1).asks, vec![(Price::new(97), Qty::new(5))]);
    assert!(engine.check_consistency());
}

#[test]
fn stop_triggers_immediately_when_condition_met() {
    let mut engine = MatchingEngine::new();

    engine.submit_limit(Side::Sell, 100, 1).unwrap();
    engine.submit_market(Side::Buy, 1).unwrap();

    // Sell stop with trigger at 100 fires on arrival (last trade <= trigger)
    let (stop_id, events) = engine.submit_stop(Side::Sell, 100, 99, 2).unwrap();
    assert!(events.contains(&EngineEvent::StopTriggered { order_id: stop_id }));
    assert_eq!(engine.stats().pending_stops, 0);
    assert_eq!(engine.best_ask(), Some(Price::new(99)));
}

#[test]
fn stop_market_conversion_reports_residual() {
    let mut engine = MatchingEngine::new();

    engine.submit_limit(Side::Sell, 100, 1).unwrap();
    engine.submit_market(Side::Buy, 1).unwrap();

    // Stop-market (limit price 0) with an empty bid side: converts and
    // drops the residual with a notice
    let (stop_id, events) = engine.submit_stop(Side::Sell, 100, 0, 3).unwrap();
    assert!(events.contains(&EngineEvent::StopTriggered { order_id: stop_id }));
    assert!(events.contains(&EngineEvent::MarketUnfilled {
        order_id: stop_id,
        unfilled_qty: Qty::new(3)
    }));
    assert_eq!(engine.active_count(), 0);
}

#[test]
fn cancel_is_idempotent() {
    let mut engine = MatchingEngine::new();

    let (order_id, _) = engine.submit_limit(Side::Buy, 100, 5).unwrap();
    assert!(engine.cancel(order_id));
    assert!(!engine.cancel(order_id));
    assert_eq!(engine.active_count(), 0);
    assert!(engine.check_consistency());
}

#[test]
fn cancel_unknown_id_leaves_state_alone() {
    let mut engine = MatchingEngine::new();
    engine.submit_limit(Side::Buy, 100, 5).unwrap();

    assert!(!engine.cancel(OrderId::new(999)));
    assert_eq!(engine.active_count(), 1);
    assert_eq!(engine.depth(1).bids, vec![(Price::new(100), Qty::new(5))]);
}

#[test]
fn cancel_interior_order_preserves_fifo() {
    let mut engine = MatchingEngine::new();

    let (first, _) = engine.submit_limit(Side::Sell, 100, 1).unwrap();
    let (second, _) = engine.submit_limit(Side::Sell, 100, 1).unwrap();
    let (third, _) = engine.submit_limit(Side::Sell, 100, 1).unwrap();

    assert!(engine.cancel(second));

    let (_, events) = engine.submit_market(Side::Buy, 2).unwrap();
    let trades = trades_of(&events);
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].sell_id, first);
    assert_eq!(trades[1].sell_id, third);
}

#[test]
fn cancel_pending_stop() {
    let mut engine = MatchingEngine::new();

    let (stop_id, _) = engine.submit_stop(Side::Sell, 98, 97, 5).unwrap();
    assert_eq!(engine.stats().pending_stops, 1);

    assert!(engine.cancel(stop_id));
    assert_eq!(engine.stats().pending_stops, 0);
    assert!(!engine.cancel(stop_id));
}

#[test]
fn same_price_fifo_priority() {
    let mut engine = MatchingEngine::new();

    let (first, _) = engine.submit_limit(Side::Sell, 100, 5).unwrap();
    let (second, _) = engine.submit_limit(Side::Sell, 100, 5).unwrap();

    let (_, events) = engine.submit_limit(Side::Buy, 100, 7).unwrap();
    let trades = trades_of(&events);

    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].sell_id, first);
    assert_eq!(trades[0].qty, Qty::new(5));
    assert_eq!(trades[1].sell_id, second);
    assert_eq!(trades[1].qty, Qty::new(2));
}

#[test]
fn aggressive_limit_sweeps_then_rests() {
    let mut engine = MatchingEngine::new();

    engine.submit_limit(Side::Sell, 99, 3).unwrap();
    engine.submit_limit(Side::Sell, 100, 3).unwrap();

    // Buy at 100 crosses both levels, then its residual rests at 100
    let (buy_id, events) = engine.submit_limit(Side::Buy, 100, 10).unwrap();
    let trades = trades_of(&events);

    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].price, Price::new(99));
    assert_eq!(trades[1].price, Price::new(100));
    assert!(events.contains(&EngineEvent::OrderRested {
        order_id: buy_id,
        side: Side::Buy,
        price: Price::new(100),
        visible_qty: Qty::new(4),
    }));

    assert_eq!(engine.best_bid(), Some(Price::new(100)));
    assert_eq!(engine.best_ask(), None);
    assert!(engine.check_consistency());
}

#[test]
fn conservation_over_mixed_sequence() {
    let mut engine = MatchingEngine::new();

    let mut submitted_buy = 0u64;
    let mut submitted_sell = 0u64;

    for i in 0..50u64 {
        let price = 95 + (i % 10) as i64;
        if i % 2 == 0 {
            engine.submit_limit(Side::Buy, price, 3).unwrap();
            submitted_buy += 3;
        } else {
            engine.submit_limit(Side::Sell, price, 2).unwrap();
            submitted_sell += 2;
        }
        if i % 7 == 0 {
            engine.submit_market(Side::Sell, 1).unwrap();
            submitted_sell += 1;
        }
        assert!(engine.check_consistency(), "invariant broke at step {i}");
    }

    // Every trade moves equal quantity on both sides; what did not trade
    // is either resting or was a dropped market residual
    let traded: u64 = engine.trades().iter().map(|t| t.qty.as_u64()).sum();
    let resting_buy = engine
        .depth(usize::MAX)
        .bids
        .iter()
        .map(|(_, q)| q.as_u64())
        .sum::<u64>();
    let resting_sell = engine
        .depth(usize::MAX)
        .asks
        .iter()
        .map(|(_, q)| q.as_u64())
        .sum::<u64>();

    // Buy side: everything submitted either traded or rests
    assert_eq!(submitted_buy, traded + resting_buy);
    // Sell side: market residuals may additionally have been dropped
    assert!(submitted_sell >= traded + resting_sell);
}

#[test]
fn trade_qty_never_exceeds_either_side() {
    let mut engine = MatchingEngine::new();

    engine.submit_limit(Side::Sell, 100, 4).unwrap();
    engine.submit_limit(Side::Sell, 100, 2).unwrap();
    let (_, events) = engine.submit_limit(Side::Buy, 100, 5).unwrap();

    for trade in trades_of(&events) {
        assert!(trade.qty <= Qty::new(5));
        assert!(trade.qty <= Qty::new(4));
        assert_eq!(trade.price, Price::new(100));
    }
}
