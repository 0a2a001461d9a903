//! Capability traits consumed by the services.
//!
//! Each trait has one production adapter (Postgres, Redis or Redpanda) and
//! an in-memory fake in `bookshop-testing`. Services hold them as
//! `Arc<dyn Trait>`, so every trait is object-safe.

mod cache;
mod cart;
mod catalog;
mod order;
mod publisher;

pub use cache::ReservationCache;
pub use cart::CartStore;
pub use catalog::CatalogStore;
pub use order::OrderStore;
pub use publisher::EventPublisher;
