//! Cache key scheme.
//!
//! Every adapter and service builds keys through these helpers so the
//! layout stays consistent across processes.

use crate::types::{BookId, CategoryId, UserId};

/// Default lifetime of a reservation marker (30 minutes).
pub const DEFAULT_RESERVATION_TTL_SECS: u64 = 1800;

/// Default lifetime of a cached storefront listing (5 minutes).
pub const DEFAULT_BOOK_LIST_TTL_SECS: u64 = 300;

/// Reservation marker for `user` holding `book` in their cart.
#[must_use]
pub fn reservation(user_id: &UserId, book_id: BookId) -> String {
    format!("reserve:{user_id}:{book_id}")
}

/// Cached storefront listing across all categories.
#[must_use]
pub const fn book_list_all() -> &'static str {
    "books:all"
}

/// Cached storefront listing for one category.
#[must_use]
pub fn book_list_category(category_id: CategoryId) -> String {
    format!("books:cat:{category_id}")
}

/// Keys to drop after books in `categories` changed.
#[must_use]
pub fn book_list_invalidations(categories: impl IntoIterator<Item = CategoryId>) -> Vec<String> {
    let mut keys = vec![book_list_all().to_string()];
    for category_id in categories {
        let key = book_list_category(category_id);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
