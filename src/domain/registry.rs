//! Live connection tracking under a single exclusive lock.
//!
//! [`ConnectionRegistry`] maps each [`ClientId`] to its
//! [`ConnectionRecord`]. Every compound operation (insert, delete,
//! snapshot, count) runs inside one acquisition of the same
//! [`tokio::sync::Mutex`], so callers only ever observe whole operations.
//! No I/O happens while the lock is held: senders take a snapshot, drop
//! the lock, and re-resolve each handle right before writing to it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::ClientId;
use super::connection::{ConnectionRecord, SharedHandle};

/// Authoritative set of live connections.
///
/// Created once at startup and shared behind an [`Arc`] for the lifetime
/// of the process. Drained to empty during forced shutdown.
///
/// # Concurrency
///
/// - One lock guards the whole map; connection churn is rare compared with
///   message traffic, so there is no finer-grained locking.
/// - Handles are cloned out of the map, never borrowed across an `.await`.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ClientId, ConnectionRecord>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a connection, replacing any existing entry with the same id.
    ///
    /// Returns the number of live connections after the insert.
    pub async fn register(&self, id: ClientId, handle: SharedHandle) -> usize {
        let mut map = self.connections.lock().await;
        let replaced = map
            .insert(id.clone(), ConnectionRecord::new(id.clone(), handle))
            .is_some();
        let active = map.len();
        drop(map);

        if replaced {
            tracing::warn!(client_id = %id, active, "client id re-registered; previous connection replaced");
        } else {
            tracing::info!(client_id = %id, active, "client connected");
        }
        active
    }

    /// Removes a connection if present.
    ///
    /// Absent ids are a no-op, so several exit paths may clean up the same
    /// connection. Returns `true` if an entry was removed.
    pub async fn deregister(&self, id: &ClientId) -> bool {
        let mut map = self.connections.lock().await;
        let removed = map.remove(id).is_some();
        let active = map.len();
        drop(map);

        if removed {
            tracing::info!(client_id = %id, active, "client disconnected");
        }
        removed
    }

    /// Removes the entry for `id` only if it still holds `handle`.
    ///
    /// A session that was replaced by a newer connection with the same id
    /// must not evict its successor on the way out. Returns `true` if an
    /// entry was removed.
    pub async fn deregister_handle(&self, id: &ClientId, handle: &SharedHandle) -> bool {
        let mut map = self.connections.lock().await;
        let owned = map
            .get(id)
            .is_some_and(|record| same_handle(&record.handle, handle));
        if !owned {
            return false;
        }
        map.remove(id);
        let active = map.len();
        drop(map);

        tracing::info!(client_id = %id, active, "client disconnected");
        true
    }

    /// Returns a consistent copy of the current ids, sorted.
    pub async fn snapshot(&self) -> Vec<ClientId> {
        let map = self.connections.lock().await;
        let mut ids: Vec<ClientId> = map.keys().cloned().collect();
        drop(map);
        ids.sort();
        ids
    }

    /// Resolves the current handle for `id`, if it is still registered.
    pub async fn lookup(&self, id: &ClientId) -> Option<SharedHandle> {
        self.connections
            .lock()
            .await
            .get(id)
            .map(|record| Arc::clone(&record.handle))
    }

    /// Returns the registration time of `id`, if it is still registered.
    pub async fn connected_since(&self, id: &ClientId) -> Option<DateTime<Utc>> {
        self.connections
            .lock()
            .await
            .get(id)
            .map(|record| record.connected_at)
    }

    /// Returns `true` if `id` is registered.
    pub async fn contains(&self, id: &ClientId) -> bool {
        self.connections.lock().await.contains_key(id)
    }

    /// Returns the number of live connections at one point in time.
    pub async fn count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Returns `true` if no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }

    /// Holds the registry lock so tests can park a writer mid-operation.
    #[cfg(test)]
    pub(crate) async fn hold(
        &self,
    ) -> tokio::sync::MutexGuard<'_, HashMap<ClientId, ConnectionRecord>> {
        self.connections.lock().await
    }
}

/// Compares two handles by the address of the connection they point to.
fn same_handle(a: &SharedHandle, b: &SharedHandle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::test_support::{RecordingHandle, as_shared, client};

    #[tokio::test]
    async fn register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let handle = RecordingHandle::shared();

        let active = registry.register(client("a"), handle).await;
        assert_eq!(active, 1);
        assert!(registry.lookup(&client("a")).await.is_some());
        assert!(registry.connected_since(&client("a")).await.is_some());
        assert!(registry.lookup(&client("b")).await.is_none());
    }

    #[tokio::test]
    async fn duplicate_id_keeps_last_write() {
        let registry = ConnectionRegistry::new();
        let first = RecordingHandle::new();
        let second = RecordingHandle::new();

        registry.register(client("a"), as_shared(&first)).await;
        registry.register(client("a"), as_shared(&second)).await;
        assert_eq!(registry.count().await, 1);

        let Some(current) = registry.lookup(&client("a")).await else {
            panic!("id a should be registered");
        };
        let _ = current.send_text("ping").await;
        assert_eq!(second.messages(), vec!["ping".to_string()]);
        assert!(first.messages().is_empty());
    }

    #[tokio::test]
    async fn deregister_absent_is_noop() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.deregister(&client("ghost")).await);

        registry.register(client("a"), RecordingHandle::shared()).await;
        assert!(registry.deregister(&client("a")).await);
        assert!(!registry.deregister(&client("a")).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn deregister_handle_spares_replacement() {
        let registry = ConnectionRegistry::new();
        let old = RecordingHandle::shared();
        let new = RecordingHandle::shared();

        registry.register(client("a"), Arc::clone(&old)).await;
        registry.register(client("a"), Arc::clone(&new)).await;

        assert!(!registry.deregister_handle(&client("a"), &old).await);
        assert!(registry.contains(&client("a")).await);
        assert!(registry.deregister_handle(&client("a"), &new).await);
        assert!(!registry.contains(&client("a")).await);
    }

    #[tokio::test]
    async fn count_is_net_of_duplicates_and_removals() {
        let registry = ConnectionRegistry::new();
        for name in ["a", "b", "c", "a", "d"] {
            registry.register(client(name), RecordingHandle::shared()).await;
        }
        registry.deregister(&client("b")).await;
        registry.deregister(&client("zz")).await;

        assert_eq!(registry.count().await, 3);
        assert_eq!(
            registry.snapshot().await,
            vec![client("a"), client("c"), client("d")]
        );
    }

    #[tokio::test]
    async fn concurrent_churn_settles_consistently() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut tasks = Vec::new();
        for i in 0..32 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let id = client(&format!("c{i}"));
                registry.register(id.clone(), RecordingHandle::shared()).await;
                if i % 2 == 0 {
                    registry.deregister(&id).await;
                }
            }));
        }
        for task in tasks {
            let _ = task.await;
        }
        assert_eq!(registry.count().await, 16);
        assert_eq!(registry.snapshot().await.len(), 16);
    }
}
