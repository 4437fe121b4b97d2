use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use ledger_core::RecordStore;
use ledger_core::config::{
    CoreConfig, open_state, state_backend_from_env_value, state_file_from_env_value,
};

/// Main entry point for the ledger service
///
/// Opens the configured world state, runs `InitLedger` once, and serves the REST API
/// until interrupted.
///
/// # Environment Variables
/// - `LEDGER_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `LEDGER_STATE_BACKEND`: `memory` or `file` (default: "memory")
/// - `LEDGER_STATE_FILE`: snapshot path for the file backend (default: "ledger_state.json")
/// - `API_KEY`: API key required on every route except `/health` (unset disables the check)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, state loading or server startup fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ledger_run=info".parse()?)
                .add_directive("ledger_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr: SocketAddr = std::env::var("LEDGER_REST_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;

    let cfg = CoreConfig::new(
        state_backend_from_env_value(std::env::var("LEDGER_STATE_BACKEND").ok())?,
        state_file_from_env_value(std::env::var("LEDGER_STATE_FILE").ok()),
    )?;
    let state = open_state(&cfg)?;

    let store = RecordStore::new(Arc::clone(&state));
    store.init_ledger()?;

    let api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty());
    if api_key.is_none() {
        tracing::warn!("API_KEY is not set; REST routes are unauthenticated");
    }

    tracing::info!("++ Starting ledger REST on {}", rest_addr);

    let app = api_rest::router(AppState::new(store, api_key));
    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Ledger REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
