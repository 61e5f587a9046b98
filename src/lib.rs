//! # relay-gateway
//!
//! Real-time WebSocket message relay with orderly shutdown.
//!
//! Clients connect to `/ws/{client_id}`. Each text message is acknowledged
//! to its sender and relayed to every other client, and a status line is
//! broadcast periodically. On the first SIGTERM/SIGINT the relay stops
//! admitting clients, warns the connected ones, and force-closes whatever
//! is left when the grace period ends. A second signal exits immediately.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS session (ws/)          ├── /health, / (api/)
//!     │
//!     ├── Broadcaster (service/)    ├── Periodic announcer (service/)
//!     │
//!     ├── ConnectionRegistry (domain/)
//!     │
//!     └── ShutdownCoordinator (shutdown/) ── OS signals
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod shutdown;
pub mod ws;
