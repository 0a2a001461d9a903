//! Cart service: soft claims on books.
//!
//! Adding a book checks stock and records the claim in the cart store and
//! as a reservation marker in the cache. Inventory itself is never touched
//! here; the authoritative allocation happens at checkout.

use crate::metrics::{self, CartAddition};
use crate::services::release_markers;
use bookshop_core::providers::{CartStore, CatalogStore, ReservationCache};
use bookshop_core::{BookId, Cart, CartItem, Result, ShopError, UserId, keys};
use std::sync::Arc;
use std::time::Duration;

/// Per-user cart operations.
#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn CatalogStore>,
    carts: Arc<dyn CartStore>,
    cache: Arc<dyn ReservationCache>,
    reservation_ttl: Duration,
}

impl CartService {
    /// Create a cart service writing markers with `reservation_ttl`.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        carts: Arc<dyn CartStore>,
        cache: Arc<dyn ReservationCache>,
        reservation_ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            carts,
            cache,
            reservation_ttl,
        }
    }

    /// Put one more unit of `book_id` into the user's cart.
    ///
    /// Creates the cart on first use. Returns the line after the increment.
    ///
    /// # Errors
    ///
    /// - [`ShopError::NotFound`] if the book does not exist
    /// - [`ShopError::OutOfStock`] if the book has no inventory
    /// - [`ShopError::InsufficientStock`] if the cart already holds every unit
    /// - [`ShopError::Infrastructure`] if a store call fails
    pub async fn add_item(&self, user_id: &UserId, book_id: BookId) -> Result<CartItem> {
        let book = self.catalog.get_book(book_id).await?;
        if !book.in_stock() {
            metrics::record_cart_addition(CartAddition::OutOfStock);
            return Err(ShopError::OutOfStock { book_id });
        }

        let in_cart = self.carts.get_item_quantity(user_id, book_id).await?;
        if in_cart >= book.inventory {
            metrics::record_cart_addition(CartAddition::InsufficientStock);
            return Err(ShopError::InsufficientStock {
                book_id,
                in_cart,
                available: book.inventory,
            });
        }

        let mut item = self.carts.add_item(user_id, book_id).await?;
        metrics::record_cart_addition(CartAddition::Added);

        let key = keys::reservation(user_id, book_id);
        if let Err(error) = self
            .cache
            .set(&key, &item.quantity.to_string(), self.reservation_ttl)
            .await
        {
            metrics::record_cleanup_failure("reserve");
            tracing::warn!(
                user_id = %user_id,
                book_id = %book_id,
                %error,
                "Failed to write reservation marker"
            );
        }

        tracing::info!(
            user_id = %user_id,
            book_id = %book_id,
            quantity = item.quantity,
            "Book added to cart"
        );
        item.book = Some(book);
        Ok(item)
    }

    /// Remove the whole line for `book_id` and its marker.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotFound`] if the book was not in the cart. The
    /// marker is deleted either way.
    pub async fn remove_item(&self, user_id: &UserId, book_id: BookId) -> Result<()> {
        let removed = self.carts.remove_item(user_id, book_id).await?;
        release_markers(self.cache.as_ref(), user_id, [book_id], "markers").await;

        if !removed {
            return Err(ShopError::not_found("cart item", book_id));
        }
        tracing::info!(user_id = %user_id, book_id = %book_id, "Book removed from cart");
        Ok(())
    }

    /// Empty the user's cart and drop all of its markers. No cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Infrastructure`] if the cart store fails.
    pub async fn clear(&self, user_id: &UserId) -> Result<()> {
        let removed = self.carts.clear(user_id).await?;
        if removed.is_empty() {
            return Ok(());
        }

        release_markers(self.cache.as_ref(), user_id, removed.iter().copied(), "markers").await;

        tracing::info!(user_id = %user_id, removed = removed.len(), "Cart cleared");
        Ok(())
    }

    /// The user's cart with book snapshots attached.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotFound`] if the user has never added a book.
    pub async fn get_by_user_id(&self, user_id: &UserId) -> Result<Cart> {
        let mut cart = self
            .carts
            .get_cart(user_id)
            .await?
            .ok_or_else(|| ShopError::not_found("cart", user_id))?;
        cart.items = self.hydrate(cart.items).await?;
        Ok(cart)
    }

    /// Cart lines with book snapshots attached; empty without a cart.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Infrastructure`] if a store call fails.
    pub async fn list_items(&self, user_id: &UserId) -> Result<Vec<CartItem>> {
        let items = self.carts.list_items(user_id).await?;
        self.hydrate(items).await
    }

    /// Attach the current book to each line. A deleted book leaves `book` unset.
    async fn hydrate(&self, items: Vec<CartItem>) -> Result<Vec<CartItem>> {
        let mut hydrated = Vec::with_capacity(items.len());
        for mut item in items {
            item.book = match self.catalog.get_book(item.book_id).await {
                Ok(book) => Some(book),
                Err(ShopError::NotFound { .. }) => None,
                Err(error) => return Err(error),
            };
            hydrated.push(item);
        }
        Ok(hydrated)
    }
}
