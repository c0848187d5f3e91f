use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Transport-assigned identifier of a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Allocate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered, currently connected player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Connection the participant registered from.
    pub connection_id: ConnectionId,
    /// Display name. Not unique.
    pub name: String,
    /// Free-form device description supplied by the client.
    pub device: String,
}

/// Participants keyed by connection, in join order.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    participants: IndexMap<ConnectionId, Participant>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the participant for `connection_id`.
    ///
    /// Re-registering keeps the original join position.
    pub fn register(&mut self, connection_id: ConnectionId, name: String, device: String) {
        let participant = Participant {
            connection_id: connection_id.clone(),
            name,
            device,
        };
        self.participants.insert(connection_id, participant);
    }

    /// Remove the participant, returning it when it was registered.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<Participant> {
        self.participants.shift_remove(connection_id)
    }

    /// Look up a participant.
    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.participants.get(connection_id)
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether no participant is registered.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Current participants in join order.
    pub fn snapshot(&self) -> Vec<Participant> {
        self.participants.values().cloned().collect()
    }

    /// Iterate over registered connection ids.
    pub fn connection_ids(&self) -> impl Iterator<Item = &ConnectionId> {
        self.participants.keys()
    }
}
