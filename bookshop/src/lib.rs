//! # Bookshop
//!
//! HTTP storefront backend: catalog and categories, per-user carts and
//! order checkout.
//!
//! # Architecture
//!
//! ```text
//!   HTTP (axum)            api/*  ──► auth extractors
//!        │
//!        ▼
//!   Services        Catalog · Category · Cart · Order
//!        │
//!        ▼
//!   Capabilities    CatalogStore  CartStore  OrderStore  ReservationCache  EventPublisher
//!        │               └────── Postgres ──────┘          Redis            Redpanda
//! ```
//!
//! # Inventory
//!
//! Adding to a cart is a soft claim: stock is checked and a reservation
//! marker with a TTL is written, but inventory is untouched. Checkout is
//! the hard allocation: one transaction inserts the order and decrements
//! every book with a compare-and-decrement guard, so concurrent checkouts
//! can never sell more units than exist. The loser gets
//! [`ShopError::Conflict`](bookshop_core::ShopError::Conflict) and keeps
//! its cart.
//!
//! After commit, clearing the cart, dropping markers and invalidating
//! listings are best effort. Publishing `OrderPlaced` is not: its failure
//! is reported to the caller even though the order stands.

#![forbid(unsafe_code)]

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod metrics;
pub mod server;
pub mod services;

pub use config::Config;
pub use server::{AppState, Providers, build_router};
pub use services::{BookQuery, CartService, CatalogService, CategoryService, OrderService};
