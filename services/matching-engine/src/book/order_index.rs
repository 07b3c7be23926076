//! Side index from order id to arena handle
//!
//! One entry per resting order: created when an order goes to rest on a
//! ladder, deleted on full fill or cancel. Cancels resolve id → handle in
//! O(1) and the handle's intrusive links make the ladder removal O(1) too.

use rustc_hash::FxHashMap;
use types::OrderId;

use super::arena::Handle;

/// id → arena slot for every resting order
#[derive(Debug, Default)]
pub struct OrderIndex {
    map: FxHashMap<OrderId, Handle>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order_id: OrderId, handle: Handle) {
        self.map.insert(order_id, handle);
    }

    pub fn remove(&mut self, order_id: OrderId) -> Option<Handle> {
        self.map.remove(&order_id)
    }

    pub fn get(&self, order_id: OrderId) -> Option<Handle> {
        self.map.get(&order_id).copied()
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.map.contains_key(&order_id)
    }

    /// Number of resting orders
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate `(id, handle)` pairs (audit use; arbitrary order)
    pub fn iter(&self) -> impl Iterator<Item = (OrderId, Handle)> + '_ {
        self.map.iter().map(|(id, handle)| (*id, *handle))
    }
}
