use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};
use sitewatch_core::types::Timestamp;

/// Outbound queue capacity per connection.
///
/// Incremental-update events are small and frequent; a viewer that cannot
/// drain 64 of them is effectively dead and gets dropped rather than
/// allowed to backpressure publishers.
const QUEUE_CAPACITY: usize = 64;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::Sender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Bounded channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Manages all active WebSocket connections.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Each connection has its own ordered
/// outbound queue, so events from a single producer reach every subscriber
/// in publish order.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let conn = WsConnection {
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Fire-and-forget: never waits on any subscriber. Connections whose
    /// queues are full (stalled consumers) or closed are dropped from the
    /// manager; one broken viewer cannot fail delivery to the others.
    pub async fn broadcast(&self, message: Message) {
        let mut stalled: Vec<String> = Vec::new();
        {
            let conns = self.connections.read().await;
            for (conn_id, conn) in conns.iter() {
                match conn.sender.try_send(message.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(conn_id = %conn_id, "Subscriber queue full, dropping connection");
                        stalled.push(conn_id.clone());
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        stalled.push(conn_id.clone());
                    }
                }
            }
        }
        if !stalled.is_empty() {
            let mut conns = self.connections.write().await;
            for conn_id in stalled {
                conns.remove(&conn_id);
            }
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.try_send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.try_send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
