use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use sawt_core::ids::ConnectionId;

use crate::transport::Transport;

/// A live connection's transport and when it was accepted.
struct ConnectionEntry {
    transport: Arc<dyn Transport>,
    connected_at: Instant,
}

/// Bookkeeping for every live connection.
///
/// Owned by the server for its lifetime. No pipeline logic reads it.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly accepted connection and return its identity.
    pub fn register(&self, transport: Arc<dyn Transport>) -> ConnectionId {
        let id = ConnectionId::new();
        let _ = self.connections.insert(
            id.clone(),
            ConnectionEntry {
                transport,
                connected_at: Instant::now(),
            },
        );
        tracing::debug!(connection_id = %id, live = self.connections.len(), "connection registered");
        id
    }

    /// Remove a connection. Safe to call more than once; returns whether an
    /// entry was actually removed.
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        match self.connections.remove(id) {
            Some((_, entry)) => {
                tracing::debug!(
                    connection_id = %id,
                    connected_for_ms = entry.connected_at.elapsed().as_millis() as u64,
                    live = self.connections.len(),
                    "connection unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Number of live connections.
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Ask every live connection to close. Entries are removed by each
    /// connection as it winds down, not here.
    pub async fn close_all(&self) -> usize {
        let transports: Vec<(ConnectionId, Arc<dyn Transport>)> = self
            .connections
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(&entry.value().transport)))
            .collect();

        let mut closed = 0;
        for (id, transport) in transports {
            match transport.close().await {
                Ok(()) => closed += 1,
                Err(e) => tracing::debug!(connection_id = %id, error = %e, "connection already closed"),
            }
        }
        closed
    }
}
