//! Catalog service: book reads and admin writes.
//!
//! The default storefront page is cached through the same TTL cache that
//! holds reservation markers (`books:all`, `books:cat:<id>`). Every catalog
//! write drops the listings it could have changed. The cache is an
//! accelerator only: failures to read, decode or write it fall through to
//! the store.

use crate::metrics;
use crate::services::invalidate_listings;
use bookshop_core::providers::{CatalogStore, ReservationCache};
use bookshop_core::{
    Book, BookDetails, BookDraft, BookFilter, BookId, CategoryId, Result, ShopError, keys,
};
use std::sync::Arc;
use std::time::Duration;

/// Page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Storefront listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    /// Restrict to these categories (empty means all)
    pub category_ids: Vec<CategoryId>,
    /// Page size, clamped to `1..=1000`
    pub limit: Option<u32>,
    /// Rows to skip
    pub offset: Option<u32>,
}

impl BookQuery {
    fn filter(&self) -> BookFilter {
        BookFilter {
            category_ids: self.category_ids.clone(),
            in_stock_only: true,
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0),
        }
    }

    /// Cache key for this listing, if it is a cacheable default page.
    fn cache_key(&self) -> Option<String> {
        let default_page = self.offset.unwrap_or(0) == 0
            && self.limit.is_none_or(|limit| limit == DEFAULT_PAGE_SIZE);
        if !default_page {
            return None;
        }
        match self.category_ids.as_slice() {
            [] => Some(keys::book_list_all().to_string()),
            [category_id] => Some(keys::book_list_category(*category_id)),
            _ => None,
        }
    }
}

/// Book reads and admin writes.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn ReservationCache>,
    list_ttl: Duration,
}

impl CatalogService {
    /// Create a catalog service caching default listings for `list_ttl`.
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn ReservationCache>,
        list_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            list_ttl,
        }
    }

    /// One book, in or out of stock.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotFound`] if the book does not exist.
    pub async fn get_book(&self, id: BookId) -> Result<Book> {
        self.store.get_book(id).await
    }

    /// In-stock books ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Infrastructure`] if the store fails.
    pub async fn list_books(&self, query: &BookQuery) -> Result<Vec<Book>> {
        let key = query.cache_key();

        if let Some(key) = &key {
            if let Some(books) = self.cached_listing(key).await {
                tracing::debug!(key = %key, count = books.len(), "Listing served from cache");
                return Ok(books);
            }
        }

        let books = self.store.list_books(&query.filter()).await?;

        if let Some(key) = &key {
            self.cache_listing(key, &books).await;
        }
        Ok(books)
    }

    /// Validate and insert a book.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Validation`] for bad input or an unknown category.
    pub async fn create_book(&self, draft: BookDraft) -> Result<Book> {
        let new_book = draft.validate()?;
        self.require_category(new_book.details.category_id).await?;

        let book = self.store.create_book(&new_book).await?;
        invalidate_listings(self.cache.as_ref(), [book.category_id]).await;

        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        Ok(book)
    }

    /// Replace a book's editable attributes. Inventory is preserved.
    ///
    /// # Errors
    ///
    /// - [`ShopError::NotFound`] if the book does not exist
    /// - [`ShopError::Validation`] for bad input or an unknown category
    pub async fn update_book(&self, id: BookId, details: BookDetails) -> Result<Book> {
        let details = details.validate()?;
        self.require_category(details.category_id).await?;

        let mut book = self.store.get_book(id).await?;
        let previous_category = book.category_id;
        details.apply_to(&mut book);

        let updated = self.store.update_book(&book).await?;
        invalidate_listings(
            self.cache.as_ref(),
            [previous_category, updated.category_id],
        )
        .await;

        tracing::info!(book_id = %id, "Book updated");
        Ok(updated)
    }

    /// Delete a book. Cart lines referring to it fail at checkout.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotFound`] if the book does not exist.
    pub async fn delete_book(&self, id: BookId) -> Result<()> {
        let book = self.store.get_book(id).await?;
        self.store.delete_book(id).await?;
        invalidate_listings(self.cache.as_ref(), [book.category_id]).await;

        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }

    async fn require_category(&self, id: CategoryId) -> Result<()> {
        match self.store.get_category(id).await {
            Ok(_) => Ok(()),
            Err(ShopError::NotFound { .. }) => Err(ShopError::validation(format!(
                "category {id} does not exist"
            ))),
            Err(error) => Err(error),
        }
    }

    async fn cached_listing(&self, key: &str) -> Option<Vec<Book>> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(key = %key, %error, "Listing cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(books) => Some(books),
            Err(error) => {
                tracing::warn!(key = %key, %error, "Discarding undecodable cached listing");
                None
            }
        }
    }

    async fn cache_listing(&self, key: &str, books: &[Book]) {
        let encoded = match serde_json::to_string(books) {
            Ok(encoded) => encoded,
            Err(error) => {
                tracing::warn!(key = %key, %error, "Failed to encode listing for cache");
                return;
            }
        };
        if let Err(error) = self.cache.set(key, &encoded, self.list_ttl).await {
            metrics::record_cleanup_failure("listing_cache");
            tracing::warn!(key = %key, %error, "Listing cache write failed");
        }
    }
}
