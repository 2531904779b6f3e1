//! Group Ledger - API Server Binary
//!
//! This binary starts the HTTP API server for the group expense ledger.
//!
//! # Usage
//!
//! ```bash
//! # Run with in-memory storage
//! cargo run --bin groups-api
//!
//! # Run against PostgreSQL
//! GROUPS_API_STORAGE=postgres GROUPS_API_DATABASE_URL=postgres://... cargo run --bin groups-api
//! ```
//!
//! # Environment Variables
//!
//! * `GROUPS_API_HOST` - Server host (default: 0.0.0.0)
//! * `GROUPS_API_PORT` - Server port (default: 8080)
//! * `GROUPS_API_STORAGE` - `memory` or `postgres` (default: memory)
//! * `GROUPS_API_DATABASE_URL` - PostgreSQL connection string
//! * `GROUPS_API_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `GROUPS_API_DB_MIN_CONNECTIONS` - Idle connections kept open (default: 1)
//! * `GROUPS_API_DB_CONNECT_TIMEOUT_SECS` - Wait for a pooled connection (default: 5)
//! * `GROUPS_API_DB_IDLE_TIMEOUT_SECS` - Close idle connections after (default: 600)
//! * `GROUPS_API_DB_MAX_LIFETIME_SECS` - Recycle connections after (default: 1800)
//! * `GROUPS_API_LOG_LEVEL` - Log level or filter directive (default: info)
//! * `GROUPS_API_LOG_JSON` - Emit JSON log lines (default: false)
//! * `GROUPS_API_MAX_RETRIES` - Retries on concurrent update conflicts (default: 3)
//! * `GROUPS_API_RETRY_DELAY_MS` - Base retry backoff (default: 10)
//! * `GROUPS_API_REQUEST_TIMEOUT_SECS` - Request timeout (default: 30)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use domain_groups::{GroupPort, GroupService, InMemoryGroupPort};
use infra_db::{create_pool, run_migrations, PostgresGroupAdapter};
use interface_api::{
    config::{ApiConfig, StorageBackend},
    create_router,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, connects the storage backend,
/// and starts the HTTP server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("Invalid GROUPS_API_* configuration")?;

    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        storage = ?config.storage,
        "Starting Group Ledger API Server"
    );

    let port = connect_storage(&config).await?;
    let service = GroupService::with_retry_policy(port, config.retry_policy());

    let app = create_router(service, config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("Invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let json = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().with_target(true));
    let text = (!config.log_json).then(|| tracing_subscriber::fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

/// Builds the group port for the configured backend.
///
/// For PostgreSQL this connects the pool and applies pending migrations.
async fn connect_storage(config: &ApiConfig) -> anyhow::Result<Arc<dyn GroupPort>> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, groups are lost on restart");
            Ok(Arc::new(InMemoryGroupPort::new()))
        }
        StorageBackend::Postgres => {
            let pool = create_pool(config.database_config())
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            Ok(Arc::new(PostgresGroupAdapter::new(pool)))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// In-flight requests are allowed to complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
