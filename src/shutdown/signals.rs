//! OS termination signals routed into the coordinator.

use std::sync::Arc;

use super::coordinator::ShutdownCoordinator;
use crate::error::RelayError;

/// Forwards SIGTERM and SIGINT to
/// [`ShutdownCoordinator::request_termination`] for the life of the
/// process.
///
/// Both signals are equivalent. The listener keeps running after the first
/// one so that a second signal can escalate to an immediate exit.
///
/// # Errors
///
/// Returns [`RelayError::Internal`] if the signal handlers cannot be
/// installed.
#[cfg(unix)]
pub async fn listen_for_signals(coordinator: Arc<ShutdownCoordinator>) -> Result<(), RelayError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| RelayError::Internal(format!("install SIGTERM handler: {e}")))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| RelayError::Internal(format!("install SIGINT handler: {e}")))?;
    tracing::info!("signal handlers for SIGTERM and SIGINT registered");

    loop {
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            _ = sigint.recv() => tracing::info!("received SIGINT"),
        }
        coordinator.request_termination();
    }
}

/// Forwards Ctrl+C to [`ShutdownCoordinator::request_termination`] for the
/// life of the process.
///
/// # Errors
///
/// Returns [`RelayError::Internal`] if the Ctrl+C handler cannot be
/// installed.
#[cfg(not(unix))]
pub async fn listen_for_signals(coordinator: Arc<ShutdownCoordinator>) -> Result<(), RelayError> {
    loop {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| RelayError::Internal(format!("listen for Ctrl+C: {e}")))?;
        tracing::info!("received Ctrl+C");
        coordinator.request_termination();
    }
}
