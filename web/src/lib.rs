//! Axum plumbing shared by the bookshop HTTP API.
//!
//! Handlers in the `bookshop` crate return [`WebResult`]; domain errors
//! convert into [`AppError`] with `?`, which picks the status code from the
//! error's [`ErrorKind`](bookshop_core::ErrorKind) and never leaks
//! infrastructure details to the client.
//!
//! # Example
//!
//! ```ignore
//! use bookshop_web::{AppError, WebResult, correlation_id_layer};
//! use axum::{Router, routing::get, Json};
//!
//! async fn get_book(
//!     State(state): State<AppState>,
//!     Path(id): Path<i64>,
//! ) -> WebResult<Json<Book>> {
//!     Ok(Json(state.catalog.get_book(BookId::new(id)).await?))
//! }
//!
//! let app = Router::new()
//!     .route("/api/books/:id", get(get_book))
//!     .layer(correlation_id_layer())
//!     .with_state(app_state);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use error::AppError;
pub use extractors::CorrelationId;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
