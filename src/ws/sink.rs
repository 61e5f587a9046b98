//! [`ConnectionHandle`] over the write half of a WebSocket.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message};
use futures_util::{Sink, SinkExt};
use tokio::sync::Mutex;

use crate::domain::ConnectionHandle;
use crate::error::RelayError;

/// Outbound half of a WebSocket, shareable between the session and any
/// broadcaster.
///
/// Writes are serialized through an async mutex so a fan-out and the
/// session's own acknowledgment never interleave frames.
pub struct WsHandle<S> {
    sink: Mutex<S>,
    closed: AtomicBool,
}

impl<S> WsHandle<S> {
    /// Wraps the write half returned by `WebSocket::split`.
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            sink: Mutex::new(sink),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns `true` once a close frame has been sent.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl<S> fmt::Debug for WsHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsHandle")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S, E> ConnectionHandle for WsHandle<S>
where
    S: Sink<Message, Error = E> + Unpin + Send,
    E: fmt::Display + Send,
{
    async fn send_text(&self, text: &str) -> Result<(), RelayError> {
        if self.is_closed() {
            return Err(RelayError::ConnectionClosed);
        }
        self.sink
            .lock()
            .await
            .send(Message::text(text.to_owned()))
            .await
            .map_err(|e| RelayError::SendFailed(e.to_string()))
    }

    async fn close_with(&self, code: u16, reason: &str) -> Result<(), RelayError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let frame = CloseFrame {
            code,
            reason: reason.to_owned().into(),
        };
        let mut sink = self.sink.lock().await;
        sink.send(Message::Close(Some(frame)))
            .await
            .map_err(|e| RelayError::SendFailed(e.to_string()))?;
        sink.close()
            .await
            .map_err(|e| RelayError::SendFailed(e.to_string()))
    }
}
