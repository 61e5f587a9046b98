//! Connection handle seam and the registry's per-connection record.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ClientId;
use crate::error::RelayError;

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSE_CODE: u16 = 1000;

/// Outbound half of a client connection.
///
/// Implemented by the WebSocket write half in [`crate::ws::sink`] and by
/// in-memory fakes in tests. Both operations are single best-effort
/// attempts; failures are reported, never retried.
#[async_trait]
pub trait ConnectionHandle: Send + Sync + fmt::Debug {
    /// Sends one text message.
    ///
    /// # Errors
    ///
    /// Returns a transport error ([`RelayError::SendFailed`] or
    /// [`RelayError::ConnectionClosed`]) if the frame could not be written.
    async fn send_text(&self, text: &str) -> Result<(), RelayError>;

    /// Closes the connection with the given close code and reason.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the close frame could not be written.
    async fn close_with(&self, code: u16, reason: &str) -> Result<(), RelayError>;

    /// Closes the connection with a normal (1000) close frame.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the close frame could not be written.
    async fn close(&self) -> Result<(), RelayError> {
        self.close_with(NORMAL_CLOSE_CODE, "").await
    }
}

/// Shared pointer to a connection's outbound half.
pub type SharedHandle = Arc<dyn ConnectionHandle>;

/// One live entry of the [`super::ConnectionRegistry`].
#[derive(Debug, Clone)]
pub struct ConnectionRecord {
    /// Client identifier (immutable after registration).
    pub id: ClientId,

    /// Outbound half of the connection.
    pub handle: SharedHandle,

    /// Registration timestamp.
    pub connected_at: DateTime<Utc>,
}

impl ConnectionRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(id: ClientId, handle: SharedHandle) -> Self {
        Self {
            id,
            handle,
            connected_at: Utc::now(),
        }
    }
}
