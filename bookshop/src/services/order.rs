//! Order service: checkout and order history.
//!
//! # Checkout
//!
//! ```text
//! cart lines ──► re-fetch books ──► guarded atomic write ──► cleanup ──► publish
//!                 (fail fast)       (all or nothing)        (best effort)
//! ```
//!
//! The pre-check against freshly read inventory gives an early, precise
//! rejection. It is not the race guard: two checkouts can both pass it.
//! The compare-and-decrement inside [`OrderStore::create_order_atomic`]
//! decides which of them commits.

use crate::metrics;
use crate::services::{invalidate_listings, release_markers};
use bookshop_core::providers::{CartStore, CatalogStore, EventPublisher, OrderStore, ReservationCache};
use bookshop_core::{
    BookId, CartItem, CategoryId, ConflictReason, NewOrder, NewOrderItem, Order, OrderPlaced, Result,
    ShopError, UserId,
};
use std::sync::Arc;

/// Checkout and order queries.
#[derive(Clone)]
pub struct OrderService {
    catalog: Arc<dyn CatalogStore>,
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    cache: Arc<dyn ReservationCache>,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderService {
    /// Create an order service.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        cache: Arc<dyn ReservationCache>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            catalog,
            carts,
            orders,
            cache,
            publisher,
        }
    }

    /// Turn the user's cart into an order.
    ///
    /// On success the inventory of every purchased book has been decremented
    /// by the purchased quantity, the cart is empty and `OrderPlaced` has been
    /// published.
    ///
    /// # Errors
    ///
    /// - [`ShopError::EmptyCart`] if the cart has no lines; nothing is written
    /// - [`ShopError::NotFound`] if a book in the cart was deleted; nothing is
    ///   written and the cart is kept
    /// - [`ShopError::Conflict`] if a book's stock no longer covers the line;
    ///   nothing is written and the cart is kept
    /// - [`ShopError::Publish`] if the order committed but the event could not
    ///   be published
    /// - [`ShopError::Infrastructure`] if a store fails before commit
    pub async fn create(&self, user_id: &UserId) -> Result<Order> {
        let items = self.carts.list_items(user_id).await?;
        if items.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        let (lines, categories) = match self.price_lines(&items).await {
            Ok(priced) => priced,
            Err(error) => {
                if let ShopError::Conflict { book_id, reason } = &error {
                    metrics::record_checkout_conflict();
                    tracing::info!(
                        user_id = %user_id,
                        book_id = %book_id,
                        %reason,
                        "Checkout rejected before write"
                    );
                }
                return Err(error);
            }
        };

        let new_order = NewOrder {
            user_id: user_id.clone(),
            items: lines,
        };
        let order = match self.orders.create_order_atomic(&new_order).await {
            Ok(order) => order,
            Err(error) => {
                if matches!(error, ShopError::Conflict { .. }) {
                    metrics::record_checkout_conflict();
                }
                return Err(error);
            }
        };

        metrics::record_order_placed(order.units(), order.total());
        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            lines = order.items.len(),
            total = %order.total(),
            "Order placed"
        );

        self.clean_up_after_commit(user_id, &items, categories).await;

        let event = OrderPlaced::from(&order);
        if let Err(error) = self.publisher.publish_order_placed(&event).await {
            metrics::record_publish_failure();
            tracing::error!(
                order_id = %order.id,
                user_id = %user_id,
                %error,
                "Failed to publish OrderPlaced"
            );
            return Err(ShopError::Publish {
                order_id: order.id,
                reason: error.to_string(),
            });
        }

        Ok(order)
    }

    /// The user's orders with their lines, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Infrastructure`] if the order store fails.
    pub async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        self.orders.list_orders_by_user(user_id).await
    }

    /// Re-read every book, snapshot its price and check the line still fits.
    async fn price_lines(
        &self,
        items: &[CartItem],
    ) -> Result<(Vec<NewOrderItem>, Vec<CategoryId>)> {
        let mut lines = Vec::with_capacity(items.len());
        let mut categories = Vec::with_capacity(items.len());

        for item in items {
            let book = self.catalog.get_book(item.book_id).await?;

            if !book.can_fulfil(item.quantity) {
                return Err(ShopError::Conflict {
                    book_id: book.id,
                    reason: ConflictReason::InsufficientStock {
                        requested: item.quantity,
                        available: book.inventory,
                    },
                });
            }

            lines.push(NewOrderItem {
                book_id: book.id,
                price: book.price,
                quantity: item.quantity,
            });
            categories.push(book.category_id);
        }

        Ok((lines, categories))
    }

    /// Drop the ordered lines with their markers, and stale listings. Never fails.
    ///
    /// Lines added after the cart was read stay in the cart, markers included.
    async fn clean_up_after_commit(
        &self,
        user_id: &UserId,
        items: &[CartItem],
        categories: Vec<CategoryId>,
    ) {
        let ordered: Vec<BookId> = items.iter().map(|item| item.book_id).collect();
        match self.carts.remove_items(user_id, &ordered).await {
            Ok(removed) => {
                release_markers(self.cache.as_ref(), user_id, removed, "markers").await;
            }
            Err(error) => {
                metrics::record_cleanup_failure("cart");
                tracing::error!(user_id = %user_id, %error, "Failed to clear cart after checkout");
            }
        }

        invalidate_listings(self.cache.as_ref(), categories).await;
    }
}
