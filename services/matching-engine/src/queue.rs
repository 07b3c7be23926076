//! Multi-producer event queue feeding the engine worker
//!
//! Producers enqueue and return; the single consumer drains with a
//! non-blocking pop. `SegQueue` gives lock-free multi-producer enqueue and
//! linearizes events from distinct producers while preserving per-producer
//! FIFO order. Closing the queue rejects new submissions but leaves the
//! tail for the worker to drain.

use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use types::EngineError;

use crate::events::OrderEvent;

/// Lock-free MPSC queue with a cooperative shutdown flag
pub struct EventQueue {
    inner: SegQueue<OrderEvent>,
    open: AtomicBool,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            inner: SegQueue::new(),
            open: AtomicBool::new(true),
        }
    }

    /// Enqueue a submission; fails once the queue has been closed
    pub fn push(&self, event: OrderEvent) -> Result<(), EngineError> {
        if !self.is_open() {
            return Err(EngineError::Shutdown);
        }
        self.inner.push(event);
        Ok(())
    }

    /// Non-blocking consumer-side pop
    pub fn try_dequeue(&self) -> Option<OrderEvent> {
        self.inner.pop()
    }

    /// Stop accepting submissions; queued events remain drainable
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
