//! Downstream notifications.

use crate::error::Result;
use crate::event::OrderPlaced;
use async_trait::async_trait;

/// Publishes domain events to downstream consumers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Notify consumers (fulfilment, analytics) that an order committed.
    ///
    /// # Errors
    ///
    /// [`ShopError::Infrastructure`](crate::ShopError::Infrastructure) if the
    /// broker did not acknowledge the message.
    async fn publish_order_placed(&self, event: &OrderPlaced) -> Result<()>;
}
