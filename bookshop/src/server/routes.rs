//! Router configuration for the bookshop.

use super::state::AppState;
use crate::api::{books, cart, categories, orders};
use axum::{
    Router,
    routing::{delete, get},
};
use bookshop_web::{correlation_id_layer, handlers::health_check};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Catalog reads are public. Catalog writes need the admin role; cart and
/// order routes need any valid token. The extractor on each handler
/// enforces this.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            get(categories::get_category)
                .put(categories::rename_category)
                .delete(categories::delete_category),
        )
        // Cart
        .route(
            "/cart",
            get(cart::get_cart)
                .post(cart::add_to_cart)
                .delete(cart::clear_cart),
        )
        .route("/cart/:book_id", delete(cart::remove_from_cart))
        // Orders
        .route("/orders", get(orders::list_orders).post(orders::place_order));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
