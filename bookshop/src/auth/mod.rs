//! Authentication.
//!
//! Every cart and order route requires a bearer token; catalog writes
//! additionally require the admin role. See [`middleware`] for the Axum
//! extractors and [`identity`] for token validation.

pub mod identity;
pub mod middleware;

pub use identity::{AuthError, ClaimsTokenValidator, Identity, TokenValidator};
pub use middleware::{AdminUser, AuthenticatedUser, BearerToken};
