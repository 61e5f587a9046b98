//! WebSocket layer: upgrade handling, sessions, and outbound texts.
//!
//! The endpoint at `/ws/{client_id}` provides a bidirectional plain-text
//! session. Every message a client sends is acknowledged to it and relayed
//! to all other connected clients.

pub mod handler;
pub mod messages;
pub mod session;
pub mod sink;

pub use session::{SessionEnd, run_session};
pub use sink::WsHandle;
