//! In-memory connection fakes shared by unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::ClientId;
use super::connection::{ConnectionHandle, SharedHandle};
use crate::error::RelayError;

/// Records every frame it is asked to send.
#[derive(Debug, Default)]
pub(crate) struct RecordingHandle {
    sent: Mutex<Vec<String>>,
    closed: AtomicBool,
    failing: AtomicBool,
    stalling: AtomicBool,
    close_frame: Mutex<Option<(u16, String)>>,
}

impl RecordingHandle {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A handle whose sends always fail.
    pub(crate) fn failing() -> Arc<Self> {
        let handle = Self::new();
        handle.failing.store(true, Ordering::SeqCst);
        handle
    }

    /// A handle whose sends never complete.
    pub(crate) fn stalling() -> Arc<Self> {
        let handle = Self::new();
        handle.stalling.store(true, Ordering::SeqCst);
        handle
    }

    pub(crate) fn shared() -> SharedHandle {
        Self::new()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close code and reason of the close call, if any.
    pub(crate) fn close_frame(&self) -> Option<(u16, String)> {
        self.close_frame.lock().ok().and_then(|frame| frame.clone())
    }
}

#[async_trait]
impl ConnectionHandle for RecordingHandle {
    async fn send_text(&self, text: &str) -> Result<(), RelayError> {
        if self.stalling.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RelayError::SendFailed("broken pipe".to_string()));
        }
        if self.is_closed() {
            return Err(RelayError::ConnectionClosed);
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(text.to_string());
        }
        Ok(())
    }

    async fn close_with(&self, code: u16, reason: &str) -> Result<(), RelayError> {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut close) = self.close_frame.lock() {
            *close = Some((code, reason.to_string()));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RelayError::SendFailed("broken pipe".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn as_shared(handle: &Arc<RecordingHandle>) -> SharedHandle {
    Arc::clone(handle) as SharedHandle
}

#[allow(clippy::panic)]
pub(crate) fn client(raw: &str) -> ClientId {
    let Ok(id) = ClientId::parse(raw) else {
        panic!("invalid test client id {raw:?}");
    };
    id
}
