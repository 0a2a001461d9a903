//! Shared fixture: every service wired to the in-memory fakes.

#![allow(dead_code)]

use async_trait::async_trait;
use bookshop::config::ShopConfig;
use bookshop::{CartService, CatalogService, CategoryService, OrderService};
use bookshop_core::environment::Clock;
use bookshop_core::providers::{CartStore, ReservationCache};
use bookshop_core::{BookId, Cart, CartItem, Result as ShopResult, UserId, keys};
use bookshop_testing::mocks::test_clock;
use bookshop_testing::{InMemoryReservationCache, InMemoryStore, RecordingEventPublisher};
use std::sync::Arc;
use std::time::Duration;

/// Fakes plus the services built on them.
pub struct Shop {
    pub store: InMemoryStore,
    pub cache: InMemoryReservationCache,
    pub publisher: RecordingEventPublisher,
    pub catalog: CatalogService,
    pub categories: CategoryService,
    pub cart: CartService,
    pub orders: OrderService,
}

impl Shop {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(test_clock()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        bookshop_testing::init_test_tracing();

        let config = ShopConfig::default();
        let store = InMemoryStore::new(Arc::clone(&clock));
        let cache = InMemoryReservationCache::new(clock);
        let publisher = RecordingEventPublisher::new();

        let catalog = CatalogService::new(
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            config.book_list_ttl(),
        );
        let categories = CategoryService::new(
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            config.fallback_category.clone(),
        );
        let cart = CartService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            config.reservation_ttl(),
        );
        let orders = OrderService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            Arc::new(publisher.clone()),
        );

        Self {
            store,
            cache,
            publisher,
            catalog,
            categories,
            cart,
            orders,
        }
    }

    /// Cart store over this shop's fakes where `user` adds `late` right
    /// before any lines are removed.
    pub fn late_add(&self, user: &UserId, late: BookId) -> LateAddCartStore {
        LateAddCartStore {
            inner: self.store.clone(),
            cache: self.cache.clone(),
            user: user.clone(),
            late,
        }
    }
}

/// Cart store whose owner adds `late` just before any lines are removed.
pub struct LateAddCartStore {
    inner: InMemoryStore,
    cache: InMemoryReservationCache,
    user: UserId,
    late: BookId,
}

impl LateAddCartStore {
    async fn add_late_book(&self) -> ShopResult<()> {
        self.inner.add_item(&self.user, self.late).await?;
        self.cache
            .set(
                &keys::reservation(&self.user, self.late),
                "1",
                Duration::from_secs(1800),
            )
            .await
    }
}

#[async_trait]
impl CartStore for LateAddCartStore {
    async fn get_cart(&self, user_id: &UserId) -> ShopResult<Option<Cart>> {
        self.inner.get_cart(user_id).await
    }

    async fn list_items(&self, user_id: &UserId) -> ShopResult<Vec<CartItem>> {
        self.inner.list_items(user_id).await
    }

    async fn add_item(&self, user_id: &UserId, book_id: BookId) -> ShopResult<CartItem> {
        self.inner.add_item(user_id, book_id).await
    }

    async fn remove_item(&self, user_id: &UserId, book_id: BookId) -> ShopResult<bool> {
        self.inner.remove_item(user_id, book_id).await
    }

    async fn clear(&self, user_id: &UserId) -> ShopResult<Vec<BookId>> {
        self.add_late_book().await?;
        self.inner.clear(user_id).await
    }

    async fn remove_items(&self, user_id: &UserId, book_ids: &[BookId]) -> ShopResult<Vec<BookId>> {
        self.add_late_book().await?;
        self.inner.remove_items(user_id, book_ids).await
    }

    async fn get_item_quantity(&self, user_id: &UserId, book_id: BookId) -> ShopResult<u32> {
        self.inner.get_item_quantity(user_id, book_id).await
    }
}
