//! HTTP request handlers that are not tied to a domain service.

pub mod health;

pub use health::health_check;
