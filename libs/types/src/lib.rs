//! Core domain types for the matching engine
//!
//! Everything the book and matcher agree on lives here: identifier
//! newtypes, tick-based numerics, the order entity, trade records, and the
//! error taxonomy. Prices are integer ticks throughout; no floating-point
//! value ever reaches the matching path.
//!
//! # Modules
//! - `ids`: unique identifiers (OrderId, TradeId) and the monotonic sequence
//! - `numeric`: tick-based Price and Qty newtypes
//! - `order`: order lifecycle types (sides, kinds, iceberg/stop state)
//! - `trade`: trade execution records
//! - `errors`: error taxonomy

pub mod errors;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;

pub use errors::EngineError;
pub use ids::{IdSequence, OrderId, TradeId};
pub use numeric::{Price, Qty};
pub use order::{Order, OrderKind, Side};
pub use trade::Trade;
