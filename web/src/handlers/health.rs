//! Health check endpoint.
//!
//! Used by load balancers and orchestrators to verify the process is up.

use axum::http::StatusCode;

/// Liveness probe.
///
/// Returns 200 OK while the process is serving requests. Dependencies
/// (database, cache, broker) are not checked.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
