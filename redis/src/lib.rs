//! Redis-backed [`ReservationCache`].
//!
//! Reservation markers (`reserve:<user>:<book>`) and cached storefront
//! listings (`books:*`) are plain string keys with an expiry set via
//! `SET key value EX ttl`. Nothing stored here is authoritative.
//!
//! # Example
//!
//! ```no_run
//! use bookshop_redis::RedisReservationCache;
//! use bookshop_core::providers::ReservationCache;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = RedisReservationCache::new("redis://127.0.0.1:6379").await?;
//! cache.set("reserve:user-1:42", "1", Duration::from_secs(1800)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use bookshop_core::providers::ReservationCache;
use bookshop_core::{Result, ShopError};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

/// `Redis` TTL cache.
///
/// Cloning is cheap: clones share the underlying [`ConnectionManager`],
/// which reconnects on its own after a dropped connection.
#[derive(Clone)]
pub struct RedisReservationCache {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisReservationCache {
    /// Create a new `Redis` cache.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - `Redis` connection URL (e.g., "<redis://127.0.0.1:6379>")
    ///
    /// # Errors
    ///
    /// Returns error if connection to `Redis` fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            ShopError::infrastructure(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            ShopError::infrastructure(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager })
    }

    /// Round-trip a `PING`, for readiness checks.
    ///
    /// # Errors
    ///
    /// Returns error if `Redis` does not answer.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ShopError::infrastructure(format!("Redis ping failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl ReservationCache for RedisReservationCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        // Redis rejects EX 0.
        let ttl_secs = ttl.as_secs().max(1);

        let _: () = conn
            .set_ex(key, value, ttl_secs)
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to set cache key: {e}")))?;

        tracing::debug!(key = %key, ttl_secs, "Cache key set");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn_manager.clone();
        conn.get(key)
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to get cache key: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let removed: u64 = conn
            .del(key)
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to delete cache key: {e}")))?;

        tracing::debug!(key = %key, removed, "Cache key deleted");
        Ok(())
    }
}
