//! Cart persistence.

use crate::error::Result;
use crate::types::{BookId, Cart, CartItem, UserId};
use async_trait::async_trait;

/// Durable per-user cart and its lines.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's cart with its (unhydrated) lines, `None` if never created.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn get_cart(&self, user_id: &UserId) -> Result<Option<Cart>>;

    /// The user's lines ordered by id; empty when there is no cart.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn list_items(&self, user_id: &UserId) -> Result<Vec<CartItem>>;

    /// Upsert-with-increment: creates the cart and the line when missing,
    /// otherwise adds one unit. Returns the line after the change.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn add_item(&self, user_id: &UserId, book_id: BookId) -> Result<CartItem>;

    /// Remove the whole line. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn remove_item(&self, user_id: &UserId, book_id: BookId) -> Result<bool>;

    /// Remove every line; returns the books whose lines were removed.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn clear(&self, user_id: &UserId) -> Result<Vec<BookId>>;

    /// Remove the lines for `book_ids` only; returns the books whose lines
    /// were removed. Lines for other books are left alone.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn remove_items(&self, user_id: &UserId, book_ids: &[BookId]) -> Result<Vec<BookId>>;

    /// Units of `book_id` in the user's cart, 0 if absent.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn get_item_quantity(&self, user_id: &UserId, book_id: BookId) -> Result<u32>;
}
