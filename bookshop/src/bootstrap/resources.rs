//! Resource management for infrastructure setup.
//!
//! [`ResourceManager`] connects every backing system once at startup and
//! hands the result to the HTTP layer:
//!
//! 1. Connect to Postgres and apply migrations
//! 2. Connect to Redis (reservation markers, listing cache)
//! 3. Create the Redpanda producer for `OrderPlaced`
//! 4. Build the services and make sure the fallback category exists
//!
//! # Example
//!
//! ```rust,ignore
//! let config = Config::from_env();
//! let resources = ResourceManager::from_config(&config).await?;
//! let app = build_router(resources.state.clone());
//! ```

use crate::auth::ClaimsTokenValidator;
use crate::config::Config;
use crate::server::{AppState, Providers};
use anyhow::Context;
use bookshop_postgres::{PostgresCartStore, PostgresCatalogStore, PostgresOrderStore};
use bookshop_redis::RedisReservationCache;
use bookshop_redpanda::RedpandaEventPublisher;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Central resource manager for all infrastructure components.
#[derive(Clone)]
pub struct ResourceManager {
    /// Application configuration
    pub config: Arc<Config>,

    /// Shared database pool
    pub pool: PgPool,

    /// State handed to the router
    pub state: AppState,
}

impl ResourceManager {
    /// Initialize all infrastructure resources from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The database is unreachable or a migration fails
    /// - Redis is unreachable
    /// - The Kafka producer configuration is rejected
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        info!("Connecting to database...");
        let pool = bookshop_postgres::connect(&config.postgres.url, &config.postgres.pool_settings())
            .await
            .context("connecting to Postgres")?;

        info!("Running database migrations...");
        bookshop_postgres::run_migrations(&pool)
            .await
            .context("running migrations")?;

        info!("Connecting to Redis...");
        let cache = RedisReservationCache::new(&config.redis.url)
            .await
            .context("connecting to Redis")?;
        cache.ping().await.context("pinging Redis")?;

        info!(topic = %config.redpanda.order_topic, "Creating Redpanda producer...");
        let publisher = RedpandaEventPublisher::builder()
            .brokers(&config.redpanda.brokers)
            .topic(&config.redpanda.order_topic)
            .producer_acks(&config.redpanda.producer_acks)
            .compression(&config.redpanda.compression)
            .timeout(Duration::from_millis(config.redpanda.timeout_ms))
            .build()
            .context("creating Redpanda producer")?;

        let tokens =
            ClaimsTokenValidator::new(config.auth.issuer.as_deref(), config.auth.leeway_secs);

        let providers = Providers {
            catalog: Arc::new(PostgresCatalogStore::new(pool.clone())),
            carts: Arc::new(PostgresCartStore::new(pool.clone())),
            orders: Arc::new(PostgresOrderStore::new(pool.clone())),
            cache: Arc::new(cache),
            publisher: Arc::new(publisher),
            tokens: Arc::new(tokens),
        };
        let state = AppState::new(providers, &config.shop, config.auth.admin_role.clone());

        let fallback = state
            .categories
            .ensure_fallback()
            .await
            .context("ensuring fallback category")?;
        info!(category_id = %fallback.id, name = %fallback.name, "Fallback category ready");

        Ok(Self {
            config: Arc::new(config.clone()),
            pool,
            state,
        })
    }
}
