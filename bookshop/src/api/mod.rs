//! HTTP handlers under `/api`.
//!
//! Handlers only translate: extract, call a service, shape the response.
//! Status codes for failures come from `AppError: From<ShopError>`.

pub mod books;
pub mod cart;
pub mod categories;
pub mod orders;
