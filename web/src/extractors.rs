//! Custom Axum extractors.

use crate::middleware::CORRELATION_ID_HEADER;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::fmt;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Reads the id stored by [`correlation_id_layer`](crate::correlation_id_layer)
/// so handler logs and the response header agree. Without the layer it
/// falls back to the `X-Correlation-ID` header, or a fresh UUID v4.
///
/// # Example
///
/// ```ignore
/// async fn place_order(correlation_id: CorrelationId, user: AuthenticatedUser) -> ... {
///     tracing::info!(%correlation_id, user_id = %user.id, "Checkout requested");
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// Parse an incoming header value; anything but a UUID is ignored.
    pub(crate) fn from_header(value: Option<&axum::http::HeaderValue>) -> Option<Self> {
        value
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(Self)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        Ok(Self::from_header(parts.headers.get(CORRELATION_ID_HEADER))
            .unwrap_or_else(|| Self(Uuid::new_v4())))
    }
}
