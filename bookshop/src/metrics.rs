//! Business metrics for the bookshop.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `bookshop_cart_additions_total{outcome}` - Add-to-cart attempts by outcome
//!   (`added`, `out_of_stock`, `insufficient_stock`)
//! - `bookshop_orders_placed_total` - Committed orders
//! - `bookshop_books_sold_total` - Units sold across all orders
//! - `bookshop_checkout_conflicts_total` - Checkouts rejected by stock re-validation
//! - `bookshop_cleanup_failures_total{step}` - Post-commit bookkeeping that failed
//!   (`cart`, `markers`, `listing_cache`) and best-effort marker writes (`reserve`)
//! - `bookshop_order_publish_failures_total` - `OrderPlaced` events not delivered
//!
//! ## Histograms
//! - `bookshop_order_value` - Order totals in currency units
//!
//! The Postgres adapter adds `bookshop_order_guard_rejections_total` and
//! `bookshop_order_transaction_seconds`.

use metrics::{describe_counter, describe_histogram};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Initialize and register all business metrics descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "bookshop_cart_additions_total",
        "Add-to-cart attempts by outcome (added, out_of_stock, insufficient_stock)"
    );
    describe_counter!(
        "bookshop_orders_placed_total",
        "Total number of committed orders"
    );
    describe_counter!(
        "bookshop_books_sold_total",
        "Total number of book units sold"
    );
    describe_histogram!("bookshop_order_value", "Order totals in currency units");
    describe_counter!(
        "bookshop_checkout_conflicts_total",
        "Checkouts rejected because stock changed since the cart was filled"
    );
    describe_counter!(
        "bookshop_cleanup_failures_total",
        "Best-effort cache and cart bookkeeping that failed, by step"
    );
    describe_counter!(
        "bookshop_order_publish_failures_total",
        "OrderPlaced notifications that could not be published"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Outcome of an add-to-cart attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAddition {
    /// Line created or incremented
    Added,
    /// Book had no stock
    OutOfStock,
    /// Cart already held every unit
    InsufficientStock,
}

impl CartAddition {
    const fn label(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::OutOfStock => "out_of_stock",
            Self::InsufficientStock => "insufficient_stock",
        }
    }
}

/// Record an add-to-cart attempt.
pub fn record_cart_addition(outcome: CartAddition) {
    metrics::counter!("bookshop_cart_additions_total", "outcome" => outcome.label()).increment(1);
}

/// Record a committed order.
pub fn record_order_placed(units: u64, total: Decimal) {
    metrics::counter!("bookshop_orders_placed_total").increment(1);
    metrics::counter!("bookshop_books_sold_total").increment(units);
    metrics::histogram!("bookshop_order_value").record(total.to_f64().unwrap_or_default());
}

/// Record a checkout rejected by stock re-validation.
pub fn record_checkout_conflict() {
    metrics::counter!("bookshop_checkout_conflicts_total").increment(1);
}

/// Record a failed best-effort step.
pub fn record_cleanup_failure(step: &'static str) {
    metrics::counter!("bookshop_cleanup_failures_total", "step" => step).increment(1);
}

/// Record an undelivered `OrderPlaced`.
pub fn record_publish_failure() {
    metrics::counter!("bookshop_order_publish_failures_total").increment(1);
}
