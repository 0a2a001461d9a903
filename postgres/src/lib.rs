//! `PostgreSQL` stores for the bookshop.
//!
//! Three adapters share one [`PgPool`]:
//!
//! - [`PostgresCatalogStore`]: books and categories
//! - [`PostgresCartStore`]: carts and cart lines (upsert-with-increment)
//! - [`PostgresOrderStore`]: orders, written in a single transaction together
//!   with guarded inventory decrements
//!
//! # Example
//!
//! ```no_run
//! use bookshop_postgres::{PoolSettings, connect, run_migrations, PostgresOrderStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = connect("postgres://localhost/bookshop", &PoolSettings::default()).await?;
//! run_migrations(&pool).await?;
//! let orders = PostgresOrderStore::new(pool);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cart;
mod catalog;
mod order;
mod rows;

pub use cart::PostgresCartStore;
pub use catalog::PostgresCatalogStore;
pub use order::PostgresOrderStore;

use bookshop_core::{Result, ShopError};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connection pool sizing and timeouts.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// Time to wait for a connection
    pub acquire_timeout: Duration,
    /// Connections idle longer than this are closed
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns [`ShopError::Infrastructure`] if the database is unreachable.
pub async fn connect(url: &str, settings: &PoolSettings) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .connect(url)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to connect to database: {e}")))
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns [`ShopError::Infrastructure`] if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Migration failed: {e}")))?;
    tracing::info!("Database migrations applied");
    Ok(())
}
