//! Server assembly: router, background tasks, and graceful stop.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::service::run_announcer;

/// How long to wait for background tasks once the server has stopped.
const BACKGROUND_STOP_GRACE: Duration = Duration::from_secs(1);

/// Serves the relay on `listener` until the shutdown coordinator stops it.
///
/// Spawns the periodic announcer and the coordinator's drain task, then
/// runs the HTTP server. Returns once the server has stopped and the
/// background tasks have wound down (or the stop grace has passed).
///
/// # Errors
///
/// Returns [`RelayError::Internal`] if the HTTP server fails.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    config: &RelayConfig,
) -> Result<(), RelayError> {
    let announcer = tokio::spawn(run_announcer(
        state.broadcaster.clone(),
        state.shutdown.signal(),
        config.broadcast_interval(),
    ));
    let coordinator = tokio::spawn({
        let shutdown = Arc::clone(&state.shutdown);
        async move { shutdown.run().await }
    });

    let stop = state.shutdown.server_stop();
    let signal = state.shutdown.signal();
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .await
        .map_err(|e| RelayError::Internal(format!("http server: {e}")))?;
    tracing::info!("http server stopped");

    // Make sure the announcer sees the stop even if the server ended on its own.
    signal.trigger();
    match tokio::time::timeout(BACKGROUND_STOP_GRACE, coordinator).await {
        Ok(Ok(outcome)) => tracing::info!(?outcome, "shutdown sequence finished"),
        Ok(Err(err)) => tracing::error!(error = %err, "shutdown task failed"),
        Err(_) => tracing::warn!("shutdown task did not finish in time"),
    }
    if tokio::time::timeout(BACKGROUND_STOP_GRACE, announcer)
        .await
        .is_err()
    {
        tracing::warn!("periodic announcer did not stop in time");
    }
    Ok(())
}
