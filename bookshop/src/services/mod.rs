//! Application services.
//!
//! Each service is stateless apart from its collaborators, which it holds as
//! `Arc<dyn Trait>`. Services are cheap to share behind an `Arc` and every
//! method takes the acting user explicitly.

pub mod cart;
pub mod catalog;
pub mod category;
pub mod order;

pub use cart::CartService;
pub use catalog::{BookQuery, CatalogService};
pub use category::CategoryService;
pub use order::OrderService;

use crate::metrics;
use bookshop_core::providers::ReservationCache;
use bookshop_core::{BookId, CategoryId, UserId, keys};

/// Drop reservation markers. Failures are logged and counted, never returned.
pub(crate) async fn release_markers(
    cache: &dyn ReservationCache,
    user_id: &UserId,
    books: impl IntoIterator<Item = BookId>,
    step: &'static str,
) {
    for book_id in books {
        let key = keys::reservation(user_id, book_id);
        if let Err(error) = cache.delete(&key).await {
            metrics::record_cleanup_failure(step);
            tracing::warn!(
                user_id = %user_id,
                book_id = %book_id,
                %error,
                "Failed to delete reservation marker"
            );
        }
    }
}

/// Drop cached storefront listings touched by a change to `categories`.
pub(crate) async fn invalidate_listings(
    cache: &dyn ReservationCache,
    categories: impl IntoIterator<Item = CategoryId>,
) {
    for key in keys::book_list_invalidations(categories) {
        if let Err(error) = cache.delete(&key).await {
            metrics::record_cleanup_failure("listing_cache");
            tracing::warn!(key = %key, %error, "Failed to invalidate listing cache");
        }
    }
}
