//! Catalog persistence.

use crate::error::Result;
use crate::types::{Book, BookFilter, BookId, Category, CategoryId, NewBook};
use async_trait::async_trait;

/// Durable records for books and categories.
///
/// `update_book` serves admin edits and category reassignment. It never
/// changes inventory: stock only moves inside
/// [`OrderStore::create_order_atomic`](super::OrderStore::create_order_atomic).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch one book.
    ///
    /// # Errors
    ///
    /// [`ShopError::NotFound`](crate::ShopError::NotFound) if absent.
    async fn get_book(&self, id: BookId) -> Result<Book>;

    /// List books matching `filter`, ordered by id.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>>;

    /// Insert a book and return it with its id and timestamps.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn create_book(&self, book: &NewBook) -> Result<Book>;

    /// Persist the editable attributes of `book`; inventory is left as stored.
    ///
    /// # Errors
    ///
    /// [`ShopError::NotFound`](crate::ShopError::NotFound) if absent.
    async fn update_book(&self, book: &Book) -> Result<Book>;

    /// Delete a book.
    ///
    /// # Errors
    ///
    /// [`ShopError::NotFound`](crate::ShopError::NotFound) if absent.
    async fn delete_book(&self, id: BookId) -> Result<()>;

    /// All categories, ordered by id.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Fetch one category.
    ///
    /// # Errors
    ///
    /// [`ShopError::NotFound`](crate::ShopError::NotFound) if absent.
    async fn get_category(&self, id: CategoryId) -> Result<Category>;

    /// Look up a category by exact name.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn create_category(&self, name: &str) -> Result<Category>;

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// [`ShopError::NotFound`](crate::ShopError::NotFound) if absent.
    async fn update_category(&self, category: &Category) -> Result<Category>;

    /// Delete a category. Callers reassign its books first.
    ///
    /// # Errors
    ///
    /// [`ShopError::NotFound`](crate::ShopError::NotFound) if absent.
    async fn delete_category(&self, id: CategoryId) -> Result<()>;
}
