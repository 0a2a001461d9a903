//! Category service.
//!
//! One category is the fallback (by name, `Uncategorized` unless
//! configured otherwise). Deleting any other category first moves its
//! books there. The fallback itself can be neither deleted nor renamed.

use crate::services::invalidate_listings;
use bookshop_core::providers::{CatalogStore, ReservationCache};
use bookshop_core::{BookFilter, Category, CategoryId, Result, ShopError};
use std::sync::Arc;

/// Books moved per listing round during reassignment.
const REASSIGN_BATCH: u32 = 500;

/// Category administration.
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn ReservationCache>,
    fallback_name: String,
}

impl CategoryService {
    /// Create a category service using `fallback_name` as the fallback category.
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn ReservationCache>,
        fallback_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cache,
            fallback_name: fallback_name.into(),
        }
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Infrastructure`] if the store fails.
    pub async fn list(&self) -> Result<Vec<Category>> {
        self.store.list_categories().await
    }

    /// One category.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotFound`] if it does not exist.
    pub async fn get(&self, id: CategoryId) -> Result<Category> {
        self.store.get_category(id).await
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Validation`] for a blank or duplicate name.
    pub async fn create(&self, name: &str) -> Result<Category> {
        let name = Category::normalize_name(name)?;
        self.require_unused_name(&name, None).await?;

        let category = self.store.create_category(&name).await?;
        tracing::info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// - [`ShopError::NotFound`] if it does not exist
    /// - [`ShopError::Validation`] for a blank or duplicate name, or when
    ///   renaming the fallback category
    pub async fn rename(&self, id: CategoryId, name: &str) -> Result<Category> {
        let name = Category::normalize_name(name)?;
        let mut category = self.store.get_category(id).await?;
        if category.name == self.fallback_name && name != self.fallback_name {
            return Err(ShopError::validation(format!(
                "the {} category cannot be renamed",
                self.fallback_name
            )));
        }
        self.require_unused_name(&name, Some(id)).await?;

        category.name = name;
        let renamed = self.store.update_category(&category).await?;
        tracing::info!(category_id = %id, name = %renamed.name, "Category renamed");
        Ok(renamed)
    }

    /// Delete a category, moving its books to the fallback first.
    ///
    /// # Errors
    ///
    /// - [`ShopError::NotFound`] if it does not exist
    /// - [`ShopError::Validation`] when deleting the fallback category
    pub async fn delete(&self, id: CategoryId) -> Result<()> {
        let category = self.store.get_category(id).await?;
        if category.name == self.fallback_name {
            return Err(ShopError::validation(format!(
                "the {} category cannot be deleted",
                self.fallback_name
            )));
        }

        let fallback = self.ensure_fallback().await?;
        let mut moved = 0_usize;
        loop {
            let books = self
                .store
                .list_books(&BookFilter::all_in_category(id, REASSIGN_BATCH))
                .await?;
            if books.is_empty() {
                break;
            }
            for mut book in books {
                book.category_id = fallback.id;
                self.store.update_book(&book).await?;
                moved += 1;
            }
        }

        self.store.delete_category(id).await?;
        invalidate_listings(self.cache.as_ref(), [id, fallback.id]).await;

        tracing::info!(
            category_id = %id,
            fallback_id = %fallback.id,
            moved,
            "Category deleted"
        );
        Ok(())
    }

    /// The fallback category, created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Infrastructure`] if the store fails.
    pub async fn ensure_fallback(&self) -> Result<Category> {
        if let Some(category) = self.store.get_category_by_name(&self.fallback_name).await? {
            return Ok(category);
        }
        let category = self.store.create_category(&self.fallback_name).await?;
        tracing::info!(category_id = %category.id, name = %category.name, "Fallback category created");
        Ok(category)
    }

    async fn require_unused_name(&self, name: &str, except: Option<CategoryId>) -> Result<()> {
        match self.store.get_category_by_name(name).await? {
            Some(existing) if Some(existing.id) != except => Err(ShopError::validation(
                format!("category {name} already exists"),
            )),
            _ => Ok(()),
        }
    }
}
