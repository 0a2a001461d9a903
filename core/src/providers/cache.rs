//! TTL key/value cache.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Fast key/value store with per-key expiry.
///
/// Holds reservation markers and cached storefront listings. Nothing
/// stored here is authoritative: callers must stay correct if an entry is
/// missing or stale.
#[async_trait]
pub trait ReservationCache: Send + Sync {
    /// Store `value` under `key`, expiring after `ttl`.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Read `key`; `None` if absent or expired.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Infrastructure errors only.
    async fn delete(&self, key: &str) -> Result<()>;
}
