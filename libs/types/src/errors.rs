//! Error taxonomy for the matching engine
//!
//! Argument validation fails synchronously at the submit boundary;
//! everything that can only be discovered while the engine worker applies
//! an event is reported on the outcome stream instead.

use crate::ids::OrderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced by the public submit/cancel/modify operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineError {
    /// Rejected before enqueue: zero quantity, non-positive price,
    /// inconsistent iceberg display, or a modify to zero quantity
    #[error("invalid order arguments: {reason}")]
    InvalidArgs { reason: String },

    /// Cancel or modify of an id that is not resting (unknown, already
    /// filled, or already cancelled)
    #[error("order not found: {order_id}")]
    NotFound { order_id: OrderId },

    /// Submission observed after the engine began shutting down
    #[error("engine is shut down")]
    Shutdown,
}

impl EngineError {
    pub fn invalid(reason: &str) -> Self {
        Self::InvalidArgs {
            reason: reason.to_string(),
        }
    }

    pub fn not_found(order_id: OrderId) -> Self {
        Self::NotFound { order_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::invalid("quantity must be positive");
        assert_eq!(
            err.to_string(),
            "invalid order arguments: quantity must be positive"
        );

        let err = EngineError::not_found(OrderId::new(12));
        assert_eq!(err.to_string(), "order not found: #12");
    }

    #[test]
    fn test_error_serialization() {
        let err = EngineError::not_found(OrderId::new(3));
        let json = serde_json::to_string(&err).unwrap();
        let back: EngineError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
