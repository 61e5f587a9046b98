//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::domain::ConnectionRegistry;
use crate::service::Broadcaster;
use crate::shutdown::{DrainSettings, ProcessExit, ShutdownCoordinator};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Fan-out over `registry`.
    pub broadcaster: Broadcaster,
    /// Shutdown lifecycle owner.
    pub shutdown: Arc<ShutdownCoordinator>,
}

impl AppState {
    /// Wires a fresh registry, broadcaster and coordinator from `config`.
    ///
    /// `exit` is what the coordinator calls to end the process.
    #[must_use]
    pub fn new(config: &RelayConfig, exit: Arc<dyn ProcessExit>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry), config.send_timeout());
        let shutdown = Arc::new(ShutdownCoordinator::new(
            broadcaster.clone(),
            DrainSettings::from(config),
            exit,
        ));
        Self {
            registry,
            broadcaster,
            shutdown,
        }
    }
}
