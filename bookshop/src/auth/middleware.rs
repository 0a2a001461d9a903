//! Authentication extractors.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bookshop::auth::{AdminUser, AuthenticatedUser};
//!
//! // Require authentication
//! async fn get_cart(user: AuthenticatedUser, State(state): State<AppState>) -> WebResult<...> {
//!     state.cart.get_by_user_id(&user.user_id).await
//! }
//!
//! // Require the admin role
//! async fn delete_book(_admin: AdminUser, ...) -> WebResult<StatusCode> { ... }
//! ```

use crate::auth::identity::Identity;
use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use bookshop_core::UserId;
use bookshop_web::AppError;

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
        })?;

        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}

/// Caller with a valid token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The authenticated user ID
    pub user_id: UserId,
    /// Everything the token said about the caller
    pub identity: Identity,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;

        let identity = state.tokens.validate(&bearer.0).await.map_err(|error| {
            tracing::debug!(%error, "Rejected bearer token");
            AppError::unauthorized("Invalid or expired token")
        })?;

        Ok(Self {
            user_id: identity.user_id.clone(),
            identity,
        })
    }
}

/// Caller holding the admin role.
///
/// Returns 401 without a valid token and 403 without the role.
#[derive(Debug, Clone)]
pub struct AdminUser {
    /// The authenticated admin user ID
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.identity.has_role(&state.admin_role) {
            tracing::info!(user_id = %user.user_id, "Admin route refused");
            return Err(AppError::forbidden("Admin role required"));
        }

        Ok(Self {
            user_id: user.user_id,
        })
    }
}
