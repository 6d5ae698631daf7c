//! Shop Ledger - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin ledger-api
//!
//! # Override settings from the environment
//! LEDGER_PORT=9000 DATABASE_URL=postgres://... cargo run --bin ledger-api
//! ```
//!
//! # Environment Variables
//!
//! * `DATABASE_URL` - PostgreSQL connection string
//! * `LEDGER_HOST` / `LEDGER_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `LEDGER_LOG_LEVEL` - Filter used when `RUST_LOG` is unset (default: info)
//! * `LEDGER_TIMEZONE` - Business timezone (default: Asia/Jakarta)
//! * `LEDGER_ACCOUNTS__CASH`, `LEDGER_ACCOUNTS__BANK`, ... - Account codes of the payment mapping
//! * `LEDGER_PROVISION_CHART` - Create the standard chart of accounts on startup (default: true)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_ledger::ShopChartOfAccounts;
use infra_db::{create_pool, PostgresLedgerStore};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::load().context("loading configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        timezone = %config.timezone,
        "Starting shop ledger API server"
    );

    let pool = create_pool(config.database.clone())
        .await
        .context("connecting to the ledger database")?;
    let store = Arc::new(PostgresLedgerStore::new(pool));

    if config.provision_chart {
        let created = store
            .ensure_accounts(ShopChartOfAccounts::create_standard_accounts())
            .await
            .context("provisioning the chart of accounts")?;
        tracing::info!(created, "Chart of accounts provisioned");
    }

    let addr: SocketAddr = config.server_addr().parse().context("parsing the bind address")?;
    let state = AppState::build(store, config)
        .await
        .context("resolving the account mapping")?;
    let app = create_router(state);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Installs the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish
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
