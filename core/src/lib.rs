//! # Bookshop Core
//!
//! Domain model and capability traits for the bookshop backend.
//!
//! Nothing in this crate performs I/O. It defines:
//!
//! - **Domain types** ([`types`]): books, categories, carts, orders and their ids
//! - **Error taxonomy** ([`error`]): [`ShopError`] with a machine-checkable [`ErrorKind`]
//! - **Capabilities** ([`providers`]): the store, cache and publisher traits the
//!   services depend on
//! - **Events** ([`event`]): the `OrderPlaced` notification
//! - **Keys** ([`keys`]): the cache key scheme shared by every adapter
//!
//! Adapters live in sibling crates (`bookshop-postgres`, `bookshop-redis`,
//! `bookshop-redpanda`) and in-memory fakes in `bookshop-testing`.

pub mod error;
pub mod event;
pub mod keys;
pub mod providers;
pub mod types;

pub use error::{ConflictReason, ErrorKind, Result, ShopError};
pub use event::{Event, OrderPlaced, OrderedBook};
pub use types::{
    Book, BookDetails, BookDraft, BookFilter, BookId, Cart, CartId, CartItem, CartItemId,
    Category, CategoryId, NewBook, NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderItemId,
    UserId,
};

/// Environment capabilities that are not stores.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Source of the current time.
    ///
    /// Production code uses [`SystemClock`]; tests substitute a clock they
    /// control so TTL expiry and timestamps are deterministic.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
