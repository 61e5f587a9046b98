//! Broadcast engine: fan-out with per-recipient failure isolation.
//!
//! [`Broadcaster`] never holds the registry lock while writing to a
//! socket. A pass snapshots the ids, re-resolves each handle right before
//! sending (the connection may have left in between), and bounds every
//! send with a deadline. Recipients whose send fails are collected and
//! deregistered after the pass, so one dead or stalled client can never
//! stop delivery to the others.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{ClientId, ConnectionRegistry, SharedHandle};
use crate::error::RelayError;

/// Outcome of one broadcast pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients that accepted the message.
    pub delivered: usize,
    /// Recipients whose send failed; they have been deregistered.
    pub failed: Vec<ClientId>,
}

/// Sends text to registered connections.
///
/// Cheap to clone; all clones share the same registry.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    send_timeout: Duration,
}

impl Broadcaster {
    /// Creates a broadcaster over `registry`. Each send is abandoned after
    /// `send_timeout`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    /// Returns a reference to the inner [`ConnectionRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Sends one message on one handle. Single attempt, no retry.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::SendTimeout`] if the send did not finish in
    /// time, or the transport error reported by the handle.
    pub async fn send_to(&self, handle: &SharedHandle, text: &str) -> Result<(), RelayError> {
        match tokio::time::timeout(self.send_timeout, handle.send_text(text)).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::SendTimeout {
                timeout_ms: u64::try_from(self.send_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Sends `text` to every registered connection except `exclude`.
    ///
    /// Failed recipients are deregistered once the pass is complete.
    pub async fn broadcast(&self, text: &str, exclude: &HashSet<ClientId>) -> BroadcastReport {
        let ids = self.registry.snapshot().await;
        let mut report = BroadcastReport::default();
        let mut dead: Vec<(ClientId, SharedHandle)> = Vec::new();

        for id in ids.into_iter().filter(|id| !exclude.contains(id)) {
            let Some(handle) = self.registry.lookup(&id).await else {
                continue;
            };
            match self.send_to(&handle, text).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    tracing::error!(client_id = %id, error = %err, "broadcast send failed");
                    dead.push((id, handle));
                }
            }
        }

        // Only the handle that failed is removed; a reconnect under the same
        // id during the pass keeps its entry.
        for (id, handle) in dead {
            self.registry.deregister_handle(&id, &handle).await;
            report.failed.push(id);
        }
        report
    }

    /// Sends `text` to everyone; shorthand for an empty exclusion set.
    pub async fn broadcast_all(&self, text: &str) -> BroadcastReport {
        self.broadcast(text, &HashSet::new()).await
    }

    /// Sends `text` to everyone except `id`.
    pub async fn broadcast_except(&self, text: &str, id: &ClientId) -> BroadcastReport {
        let exclude = HashSet::from([id.clone()]);
        self.broadcast(text, &exclude).await
    }

    /// Sends a farewell to every connection, closes it, and deregisters it.
    ///
    /// Every id in the snapshot is visited exactly once and removed no
    /// matter how its send or close went. Returns the number visited.
    pub async fn close_all(&self, farewell: &str) -> usize {
        let ids = self.registry.snapshot().await;
        tracing::info!(count = ids.len(), "closing all active connections");

        for id in &ids {
            if let Some(handle) = self.registry.lookup(id).await {
                if let Err(err) = self.send_to(&handle, farewell).await {
                    tracing::warn!(client_id = %id, error = %err, "farewell not delivered");
                }
                let closed = tokio::time::timeout(self.send_timeout, handle.close()).await;
                match closed {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::warn!(client_id = %id, error = %err, "close failed");
                    }
                    Err(_) => tracing::warn!(client_id = %id, "close timed out"),
                }
                self.registry.deregister_handle(id, &handle).await;
            }
        }
        ids.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::test_support::{RecordingHandle, as_shared, client};

    fn broadcaster() -> Broadcaster {
        Broadcaster::new(
            Arc::new(ConnectionRegistry::new()),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn broadcast_skips_excluded() {
        let engine = broadcaster();
        let a = RecordingHandle::new();
        let b = RecordingHandle::new();
        let c = RecordingHandle::new();
        engine.registry().register(client("A"), as_shared(&a)).await;
        engine.registry().register(client("B"), as_shared(&b)).await;
        engine.registry().register(client("C"), as_shared(&c)).await;

        let report = engine.broadcast_except("hi", &client("B")).await;

        assert_eq!(report.delivered, 2);
        assert!(report.failed.is_empty());
        assert_eq!(a.messages(), vec!["hi".to_string()]);
        assert_eq!(c.messages(), vec!["hi".to_string()]);
        assert!(b.messages().is_empty());
    }

    #[tokio::test]
    async fn failed_recipient_is_dropped_others_still_served() {
        let engine = broadcaster();
        let ok = RecordingHandle::new();
        let bad = RecordingHandle::failing();
        engine.registry().register(client("ok"), as_shared(&ok)).await;
        engine.registry().register(client("bad"), as_shared(&bad)).await;

        let report = engine.broadcast_all("news").await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, vec![client("bad")]);
        assert_eq!(ok.messages(), vec!["news".to_string()]);
        assert!(!engine.registry().contains(&client("bad")).await);
        assert_eq!(engine.registry().count().await, 1);
    }

    #[tokio::test]
    async fn single_failing_client_leaves_registry_empty() {
        let engine = broadcaster();
        engine
            .registry()
            .register(client("A"), as_shared(&RecordingHandle::failing()))
            .await;

        let report = engine.broadcast_all("x").await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(engine.registry().count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_recipient_times_out_without_blocking_others() {
        let engine = broadcaster();
        let fast = RecordingHandle::new();
        engine
            .registry()
            .register(client("a_stalled"), as_shared(&RecordingHandle::stalling()))
            .await;
        engine.registry().register(client("b_fast"), as_shared(&fast)).await;

        let report = engine.broadcast_all("tick").await;

        assert_eq!(report.failed, vec![client("a_stalled")]);
        assert_eq!(fast.messages(), vec!["tick".to_string()]);
        assert!(!engine.registry().contains(&client("a_stalled")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_during_stalled_send_keeps_new_connection() {
        let engine = broadcaster();
        engine
            .registry()
            .register(client("a"), as_shared(&RecordingHandle::stalling()))
            .await;

        let pass = tokio::spawn({
            let engine = engine.clone();
            async move { engine.broadcast_all("tick").await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fresh = RecordingHandle::new();
        engine.registry().register(client("a"), as_shared(&fresh)).await;

        let Ok(report) = pass.await else {
            panic!("broadcast task panicked");
        };
        assert_eq!(report.failed, vec![client("a")]);
        assert!(engine.registry().contains(&client("a")).await);

        let Some(current) = engine.registry().lookup(&client("a")).await else {
            panic!("reconnected client was evicted");
        };
        assert!(engine.send_to(&current, "after").await.is_ok());
        assert_eq!(fresh.messages(), vec!["after".to_string()]);
    }

    #[tokio::test]
    async fn close_all_visits_everyone_despite_failures() {
        let engine = broadcaster();
        let good = RecordingHandle::new();
        let bad = RecordingHandle::failing();
        engine.registry().register(client("good"), as_shared(&good)).await;
        engine.registry().register(client("bad"), as_shared(&bad)).await;

        let visited = engine.close_all("bye").await;

        assert_eq!(visited, 2);
        assert_eq!(good.messages(), vec!["bye".to_string()]);
        assert!(good.is_closed());
        assert!(bad.is_closed());
        assert!(engine.registry().is_empty().await);
    }

    #[tokio::test]
    async fn broadcast_on_empty_registry_is_noop() {
        let report = broadcaster().broadcast_all("nobody").await;
        assert_eq!(report, BroadcastReport::default());
    }
}
