//! Domain events published to downstream consumers.
//!
//! Events are JSON on the wire so that consumers in any language can read
//! them. The type name carries a version suffix for schema evolution.

use crate::types::{BookId, Order, OrderId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),
}

/// A serializable domain event.
pub trait Event: Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static {
    /// Stable, versioned type name, e.g. `"OrderPlaced.v1"`.
    fn event_type(&self) -> &'static str;

    /// Encode as JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SerializationError`] if encoding fails.
    fn to_json(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Decode from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DeserializationError`] if the payload does not match.
    fn from_json(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// A line of an [`OrderPlaced`] event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedBook {
    /// Purchased book
    pub book_id: BookId,
    /// Units purchased
    pub quantity: u32,
}

/// Emitted once an order has durably committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    /// Committed order
    pub order_id: OrderId,
    /// Buyer
    pub user_id: UserId,
    /// Purchased books
    pub books: Vec<OrderedBook>,
}

impl From<&Order> for OrderPlaced {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id.clone(),
            books: order
                .items
                .iter()
                .map(|item| OrderedBook {
                    book_id: item.book_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

impl Event for OrderPlaced {
    fn event_type(&self) -> &'static str {
        "OrderPlaced.v1"
    }
}
