//! Order persistence.

use crate::error::Result;
use crate::types::{NewOrder, Order, UserId};
use async_trait::async_trait;

/// Durable orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Write the order header, every line and every inventory decrement as
    /// one unit.
    ///
    /// Each decrement is guarded by `inventory >= quantity`; if any guard
    /// fails nothing is written.
    ///
    /// # Errors
    ///
    /// - [`ShopError::Conflict`](crate::ShopError::Conflict) if a guard failed
    ///   or a book disappeared.
    /// - [`ShopError::Infrastructure`](crate::ShopError::Infrastructure) on
    ///   storage failure (also fully rolled back).
    async fn create_order_atomic(&self, order: &NewOrder) -> Result<Order>;

    /// The user's orders with their lines, most recent first.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn list_orders_by_user(&self, user_id: &UserId) -> Result<Vec<Order>>;
}
