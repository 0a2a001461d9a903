//! Bookshop HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Start infrastructure
//! docker compose up -d
//!
//! # Run server
//! cargo run --bin server
//! ```

use anyhow::Context;
use bookshop::bootstrap::ResourceManager;
use bookshop::server::build_router;
use bookshop::{Config, metrics};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bookshop=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bookshop server...");

    let config = Config::from_env();
    info!(
        redis = %config.redis.url,
        redpanda = %config.redpanda.brokers,
        "Configuration loaded"
    );

    let metrics_addr: SocketAddr = format!(
        "{}:{}",
        config.server.metrics_host, config.server.metrics_port
    )
    .parse()
    .context("invalid metrics address")?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .context("installing Prometheus exporter")?;
    metrics::register_business_metrics();
    info!(address = %metrics_addr, "Metrics exporter listening");

    let resources = ResourceManager::from_config(&config).await?;
    let app = build_router(resources.state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    resources.pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
