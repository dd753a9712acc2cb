//! Registry of live real-time subscribers
//!
//! Tracks every connected WebSocket client: added on connect, removed on
//! disconnect or delivery failure. Lifecycle events are independent of the
//! broadcast loop's ticks.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Identifier handed out on registration
pub type ClientId = u64;

/// Per-connection bookkeeping
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub remote_addr: Option<String>,
    pub connected_at: DateTime<Utc>,
}

/// Registry of active real-time connections
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<ClientId, ClientInfo>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection
    pub fn register(&self, remote_addr: Option<String>) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(client_id = id, remote_addr = ?remote_addr, "Registering client");
        self.clients.insert(
            id,
            ClientInfo {
                remote_addr,
                connected_at: Utc::now(),
            },
        );
        id
    }

    /// Remove a connection, returning its info if it was registered
    pub fn deregister(&self, id: ClientId) -> Option<ClientInfo> {
        debug!(client_id = id, "Deregistering client");
        self.clients.remove(&id).map(|(_, info)| info)
    }

    /// Number of active connections
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_deregister() {
        let registry = ClientRegistry::new();
        assert!(registry.is_empty());

        let a = registry.register(Some("127.0.0.1:50000".to_string()));
        let b = registry.register(None);
        assert_eq!(registry.len(), 2);
        assert_ne!(a, b);

        let removed = registry.deregister(a).unwrap();
        assert_eq!(removed.remote_addr.as_deref(), Some("127.0.0.1:50000"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deregister_unknown_id_is_a_noop() {
        let registry = ClientRegistry::new();
        assert!(registry.deregister(42).is_none());
        assert!(registry.is_empty());
    }
}
