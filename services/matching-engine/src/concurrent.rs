//! Concurrent submission front-end
//!
//! Any number of producer threads validate, mint an id, enqueue, and
//! return; one worker thread owns the [`MatchingEngine`] outright and is
//! the sole mutator of book state. Events execute in the total order the
//! worker dequeues them, and after every committed event the worker
//! republishes a [`QuoteSnapshot`], so readers on other threads never
//! observe a torn ladder.
//!
//! Shutdown is cooperative: closing the queue rejects new submissions,
//! the worker drains whatever was already queued, then parks. A producer
//! racing the close may observe the queue still open and enqueue into the
//! drained tail; the worker consumes such stragglers before exiting.

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use types::{EngineError, OrderId, Price, Side};

use crate::engine::{
    validate_iceberg_args, validate_limit_args, validate_stop_args, EngineConfig, MatchingEngine,
};
use crate::events::{EngineEvent, OrderEvent};
use crate::queue::EventQueue;

/// Quote state republished after every committed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuoteSnapshot {
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub last_trade_price: Option<Price>,
    /// Orders resting on the ladders
    pub active_count: usize,
    /// Trades executed since start
    pub trade_count: u64,
    /// Events committed since start
    pub events_applied: u64,
}

impl QuoteSnapshot {
    /// `best_ask - best_bid` in ticks, when both sides are quoted
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => Some(ask.spread_to(bid)),
            _ => None,
        }
    }
}

struct Shared {
    queue: EventQueue,
    next_order_id: AtomicU64,
    quotes: RwLock<QuoteSnapshot>,
}

/// Multi-producer handle over a single-writer engine worker
pub struct ConcurrentEngine {
    shared: Arc<Shared>,
    events_rx: Receiver<EngineEvent>,
    worker: Option<JoinHandle<MatchingEngine>>,
}

impl ConcurrentEngine {
    /// Start a worker with default configuration
    pub fn start() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let shared = Arc::new(Shared {
            queue: EventQueue::new(),
            next_order_id: AtomicU64::new(1),
            quotes: RwLock::new(QuoteSnapshot::default()),
        });
        let (events_tx, events_rx) = channel::unbounded();
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("matching-engine".into())
            .spawn(move || worker_loop(&worker_shared, &config, &events_tx))
            .expect("failed to spawn engine worker");

        Self {
            shared,
            events_rx,
            worker: Some(worker),
        }
    }

    fn mint_id(&self) -> OrderId {
        OrderId::new(self.shared.next_order_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Enqueue a limit order; returns its freshly minted id
    pub fn submit_limit(&self, side: Side, price: i64, qty: u64) -> Result<OrderId, EngineError> {
        let (price, qty) = validate_limit_args(price, qty)?;
        let order_id = self.mint_id();
        self.shared
            .queue
            .push(OrderEvent::limit(order_id, side, price, qty, producer_now()))?;
        Ok(order_id)
    }

    /// Enqueue a market order
    pub fn submit_market(&self, side: Side, qty: u64) -> Result<OrderId, EngineError> {
        let qty = types::Qty::try_new(qty).ok_or_else(|| EngineError::invalid("quantity must be positive"))?;
        let order_id = self.mint_id();
        self.shared
            .queue
            .push(OrderEvent::market(order_id, side, qty, producer_now()))?;
        Ok(order_id)
    }

    /// Enqueue an iceberg limit order
    pub fn submit_iceberg(
        &self,
        side: Side,
        price: i64,
        total_qty: u64,
        display_qty: u64,
    ) -> Result<OrderId, EngineError> {
        let (price, total_qty, display_qty) = validate_iceberg_args(price, total_qty, display_qty)?;
        let order_id = self.mint_id();
        self.shared.queue.push(OrderEvent::iceberg(
            order_id,
            side,
            price,
            total_qty,
            display_qty,
            producer_now(),
        ))?;
        Ok(order_id)
    }

    /// Enqueue a stop-loss order (`limit_price` of 0 = stop-market)
    pub fn submit_stop(
        &self,
        side: Side,
        trigger_price: i64,
        limit_price: i64,
        qty: u64,
    ) -> Result<OrderId, EngineError> {
        let (trigger, limit, qty) = validate_stop_args(trigger_price, limit_price, qty)?;
        let order_id = self.mint_id();
        self.shared.queue.push(OrderEvent::stop(
            order_id,
            side,
            trigger,
            limit,
            qty,
            producer_now(),
        ))?;
        Ok(order_id)
    }

    /// Enqueue a cancel; the outcome (done or not found) arrives on the
    /// event stream
    pub fn cancel(&self, order_id: OrderId) -> Result<(), EngineError> {
        self.shared
            .queue
            .push(OrderEvent::cancel(order_id, producer_now()))
    }

    /// Enqueue a modify (cancel + resubmit at the tail); the outcome
    /// arrives on the event stream
    pub fn modify(
        &self,
        order_id: OrderId,
        new_price: i64,
        new_qty: u64,
    ) -> Result<(), EngineError> {
        let (price, qty) = validate_limit_args(new_price, new_qty)?;
        self.shared
            .queue
            .push(OrderEvent::modify(order_id, price, qty, producer_now()))
    }

    /// Outcome stream, in the order the worker committed events
    pub fn events(&self) -> &Receiver<EngineEvent> {
        &self.events_rx
    }

    /// Latest published quote state; never tears, may trail the queue
    pub fn quotes(&self) -> QuoteSnapshot {
        *self.shared.quotes.read()
    }

    /// Stop accepting submissions without waiting for the drain; the
    /// worker keeps consuming whatever is already queued
    pub fn close(&self) {
        self.shared.queue.close();
    }

    /// Stop accepting submissions, drain the queue, and hand back the
    /// engine for inspection
    pub fn shutdown(mut self) -> Option<MatchingEngine> {
        self.shared.queue.close();
        self.worker.take().and_then(|worker| worker.join().ok())
    }
}

impl Drop for ConcurrentEngine {
    fn drop(&mut self) {
        self.shared.queue.close();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    shared: &Shared,
    config: &EngineConfig,
    events_tx: &Sender<EngineEvent>,
) -> MatchingEngine {
    let mut engine = MatchingEngine::with_config(config);
    let mut events_applied = 0u64;

    loop {
        match shared.queue.try_dequeue() {
            Some(event) => {
                for outcome in engine.apply(&event) {
                    // Receiver may be gone; outcomes are also in the history
                    let _ = events_tx.send(outcome);
                }
                events_applied += 1;
                *shared.quotes.write() = QuoteSnapshot {
                    best_bid: engine.best_bid(),
                    best_ask: engine.best_ask(),
                    last_trade_price: engine.last_trade_price(),
                    active_count: engine.active_count(),
                    trade_count: engine.stats().trade_count,
                    events_applied,
                };
            }
            None => {
                if !shared.queue.is_open() {
                    break;
                }
                thread::sleep(config.idle_park);
            }
        }
    }

    debug!(events_applied, "engine worker drained and stopped");
    engine
}

fn producer_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
