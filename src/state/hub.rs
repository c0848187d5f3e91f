use axum::extract::ws::{Message, Utf8Bytes};
use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use crate::{
    dto::{sse::ServerEvent, ws::ServerMessage},
    state::{engine::Notifier, registry::ConnectionId},
};

#[derive(Clone)]
/// Handle used to push messages to a connected client.
pub struct ClientConnection {
    pub id: ConnectionId,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Fan-out transport: every open WebSocket plus a read-only SSE mirror.
///
/// Each connection owns an unbounded queue drained by its writer task, so messages
/// reach a given client in the order they were emitted.
pub struct ConnectionHub {
    connections: DashMap<ConnectionId, ClientConnection>,
    mirror: broadcast::Sender<ServerEvent>,
}

impl ConnectionHub {
    /// Create a hub whose SSE mirror buffers up to `mirror_capacity` events per subscriber.
    pub fn new(mirror_capacity: usize) -> Self {
        let (mirror, _receiver) = broadcast::channel(mirror_capacity);
        Self {
            connections: DashMap::new(),
            mirror,
        }
    }

    /// Track a freshly opened connection.
    pub fn insert(&self, connection: ClientConnection) {
        self.connections.insert(connection.id.clone(), connection);
    }

    /// Stop delivering to a connection.
    pub fn remove(&self, connection_id: &ConnectionId) -> Option<ClientConnection> {
        self.connections
            .remove(connection_id)
            .map(|(_, connection)| connection)
    }

    /// Whether the connection is currently open.
    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connection is open.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Subscribe to the SSE mirror of broadcast events.
    pub fn subscribe_mirror(&self) -> broadcast::Receiver<ServerEvent> {
        self.mirror.subscribe()
    }

    fn encode(message: &ServerMessage) -> Option<Utf8Bytes> {
        match message.to_json() {
            Ok(payload) => Some(payload.into()),
            Err(err) => {
                warn!(event = message.event_name(), error = %err, "failed to serialize message");
                None
            }
        }
    }
}

impl Notifier for ConnectionHub {
    fn broadcast(&self, message: &ServerMessage) {
        if let Some(text) = Self::encode(message) {
            for connection in self.connections.iter() {
                // A closed queue means the socket is tearing down; its handler removes it.
                let _ = connection.tx.send(Message::Text(text.clone()));
            }
        }

        match message.to_server_event() {
            Ok(event) => {
                let _ = self.mirror.send(event);
            }
            Err(err) => {
                warn!(event = message.event_name(), error = %err, "failed to serialize SSE payload")
            }
        }
    }

    fn unicast(&self, connection_id: &ConnectionId, message: &ServerMessage) {
        let Some(tx) = self
            .connections
            .get(connection_id)
            .map(|connection| connection.tx.clone())
        else {
            warn!(id = %connection_id, event = message.event_name(), "unicast to unknown connection");
            return;
        };

        if let Some(text) = Self::encode(message) {
            let _ = tx.send(Message::Text(text));
        }
    }
}
