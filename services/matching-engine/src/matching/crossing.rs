//! Crossing detection
//!
//! A taker crosses a resting level when its limit allows the maker's
//! price; market takers (no limit) cross any level.

use types::{Price, Side};

/// Can an incoming order trade against a resting level at `resting_price`?
pub fn crosses(taker_side: Side, taker_limit: Option<Price>, resting_price: Price) -> bool {
    match taker_limit {
        None => true,
        Some(limit) => match taker_side {
            Side::Buy => limit >= resting_price,
            Side::Sell => limit <= resting_price,
        },
    }
}
