//! Application state for the bookshop HTTP server.

use crate::auth::TokenValidator;
use crate::config::ShopConfig;
use crate::services::{CartService, CatalogService, CategoryService, OrderService};
use bookshop_core::providers::{
    CartStore, CatalogStore, EventPublisher, OrderStore, ReservationCache,
};
use std::sync::Arc;

/// The capability implementations the services are built from.
///
/// Production wires Postgres, Redis and Redpanda here; tests wire the
/// in-memory fakes.
#[derive(Clone)]
pub struct Providers {
    /// Books and categories
    pub catalog: Arc<dyn CatalogStore>,
    /// Carts and cart lines
    pub carts: Arc<dyn CartStore>,
    /// Orders and the atomic checkout write
    pub orders: Arc<dyn OrderStore>,
    /// Reservation markers and cached listings
    pub cache: Arc<dyn ReservationCache>,
    /// `OrderPlaced` sink
    pub publisher: Arc<dyn EventPublisher>,
    /// Bearer token validation
    pub tokens: Arc<dyn TokenValidator>,
}

/// Application state shared across all HTTP handlers.
///
/// It's cloned (cheaply via Arc) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Book reads and admin writes
    pub catalog: Arc<CatalogService>,
    /// Category administration
    pub categories: Arc<CategoryService>,
    /// Per-user carts
    pub cart: Arc<CartService>,
    /// Checkout and order history
    pub orders: Arc<OrderService>,
    /// Bearer token validation
    pub tokens: Arc<dyn TokenValidator>,
    /// Role required by admin routes
    pub admin_role: String,
}

impl AppState {
    /// Build every service from `providers`.
    #[must_use]
    pub fn new(providers: Providers, shop: &ShopConfig, admin_role: impl Into<String>) -> Self {
        let Providers {
            catalog,
            carts,
            orders,
            cache,
            publisher,
            tokens,
        } = providers;

        Self {
            catalog: Arc::new(CatalogService::new(
                Arc::clone(&catalog),
                Arc::clone(&cache),
                shop.book_list_ttl(),
            )),
            categories: Arc::new(CategoryService::new(
                Arc::clone(&catalog),
                Arc::clone(&cache),
                shop.fallback_category.clone(),
            )),
            cart: Arc::new(CartService::new(
                Arc::clone(&catalog),
                Arc::clone(&carts),
                Arc::clone(&cache),
                shop.reservation_ttl(),
            )),
            orders: Arc::new(OrderService::new(catalog, carts, orders, cache, publisher)),
            tokens,
            admin_role: admin_role.into(),
        }
    }
}
