//! relay-gateway server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket relay endpoint and wires
//! OS termination signals into the shutdown coordinator.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use relay_gateway::app_state::AppState;
use relay_gateway::config::RelayConfig;
use relay_gateway::server;
use relay_gateway::shutdown::{StdProcessExit, listen_for_signals};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = RelayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        drain_timeout_secs = config.drain_timeout_secs,
        broadcast_interval_secs = config.broadcast_interval_secs,
        "starting relay-gateway"
    );

    let state = AppState::new(&config, Arc::new(StdProcessExit));

    let signals = tokio::spawn(listen_for_signals(Arc::clone(&state.shutdown)));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    server::serve(listener, state, &config).await?;

    signals.abort();
    tracing::info!("relay-gateway stopped");
    Ok(())
}
