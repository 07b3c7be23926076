//! Ask (sell-side) ladder
//!
//! Price levels sorted so the best ask is the lowest price; the best level
//! is the `BTreeMap`'s first entry. A level is dropped the moment its FIFO
//! drains, so the ladder never holds an empty level at rest.

use std::collections::BTreeMap;
use types::{Price, Qty};

use super::arena::{Handle, OrderArena};
use super::price_level::PriceLevel;

/// Sell-side price ladder (best = lowest price)
#[derive(Debug, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order at the tail of its price level, creating the level
    /// if absent
    pub fn insert(&mut self, arena: &mut OrderArena, price: Price, handle: Handle) {
        self.levels
            .entry(price)
            .or_default()
            .push_back(arena, handle);
    }

    /// Remove an order from its level in O(1); drops the level if it drains
    pub fn remove(&mut self, arena: &mut OrderArena, price: Price, handle: Handle) -> bool {
        let Some(level) = self.levels.get_mut(&price) else {
            return false;
        };
        level.unlink(arena, handle);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        true
    }

    /// Best ask price (lowest)
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Mutable access to the best level
    pub fn best_level_mut(&mut self) -> Option<(Price, &mut PriceLevel)> {
        self.levels
            .iter_mut()
            .next()
            .map(|(price, level)| (*price, level))
    }

    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Drop a level that drained during matching
    pub fn drop_if_empty(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
        }
    }

    /// Top `depth` levels as `(price, visible qty)`, best first
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Qty)> {
        self.levels
            .iter()
            .take(depth)
            .map(|(price, level)| (*price, level.visible_qty()))
            .collect()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Audit: true when no level is empty and every cached aggregate
    /// matches its members
    pub fn check_levels(&self, arena: &OrderArena) -> bool {
        self.levels.values().all(|level| {
            let sum = level
                .iter(arena)
                .fold(Qty::zero(), |acc, h| acc + arena.order(h).visible_qty());
            !level.is_empty() && sum == level.visible_qty()
        })
    }
}
