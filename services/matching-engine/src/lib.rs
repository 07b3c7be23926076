//! Central limit order book and matching engine
//!
//! Price-time priority matching over a dual-ladder book with support for
//! limit, market, iceberg, and stop-loss orders.
//!
//! **Key invariants:**
//! - Price priority first, then strict FIFO within a price level
//! - Trades always execute at the resting (maker) order's price
//! - Deterministic: the same event sequence produces the same trades
//! - The book is never crossed at rest and never holds an empty level
//!
//! Two ways to drive it: [`MatchingEngine`] is the single-threaded core
//! with synchronous submits and queries; [`ConcurrentEngine`] puts the
//! same core behind a lock-free multi-producer queue with a single worker
//! thread as the sole mutator.

pub mod book;
pub mod concurrent;
pub mod engine;
pub mod events;
pub mod matching;
pub mod queue;

pub use concurrent::{ConcurrentEngine, QuoteSnapshot};
pub use engine::{DepthSnapshot, EngineConfig, EngineStats, MatchingEngine};
pub use events::{EngineEvent, EventKind, OrderEvent};
