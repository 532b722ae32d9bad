use axum::extract::ws::Utf8Bytes;
use hashbrown::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;
use uuid::Uuid;

pub type ConnectionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    Scorer,
    Viewer,
}

impl ConnectionRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConnectionRole::Scorer => "scorer",
            ConnectionRole::Viewer => "viewer",
        }
    }
}

/// Sending half of a connection's outbound queue.
/// The queue is drained by the connection's single writer task.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub connection_id: ConnectionId,
    outbound: mpsc::Sender<Utf8Bytes>,
}

impl ConnectionHandle {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Utf8Bytes>) {
        let (outbound, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            connection_id: Uuid::new_v4(),
            outbound,
        };
        (handle, receiver)
    }

    /// Queues a payload without waiting, a full queue drops it for this connection only.
    /// Returns false once the writer is gone.
    pub fn send(&self, payload: Utf8Bytes) -> bool {
        match self.outbound.try_send(payload) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(connection_id = %self.connection_id, "Outbound queue full, dropping message");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// Concurrency-safe set of connections keyed by id
#[derive(Debug, Clone, Default)]
pub struct ConnectionSet {
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionHandle>>>,
}

impl ConnectionSet {
    pub fn insert(&self, handle: ConnectionHandle) {
        let mut connections = self.connections.write().unwrap_or_else(PoisonError::into_inner);
        connections.insert(handle.connection_id, handle);
    }

    pub fn remove(&self, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.write().unwrap_or_else(PoisonError::into_inner);
        connections.remove(&connection_id).is_some()
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        connections.contains_key(&connection_id)
    }

    pub fn len(&self) -> usize {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the handles out so sends never happen under the lock
    pub fn snapshot(&self) -> Vec<ConnectionHandle> {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        connections.values().cloned().collect()
    }

    pub fn clear(&self) {
        let mut connections = self.connections.write().unwrap_or_else(PoisonError::into_inner);
        connections.clear();
    }

    /// Sends to every member except `excluded`, forgetting connections whose writer is gone.
    /// Returns how many connections accepted the payload.
    pub fn broadcast(&self, payload: &Utf8Bytes, excluded: Option<ConnectionId>) -> usize {
        let mut delivered = 0;
        for handle in self.snapshot() {
            if Some(handle.connection_id) == excluded {
                continue;
            }
            match handle.send(payload.clone()) {
                true => delivered += 1,
                false => {
                    self.remove(handle.connection_id);
                }
            }
        }
        delivered
    }
}
