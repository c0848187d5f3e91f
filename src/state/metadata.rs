use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::Value;

use crate::state::registry::ConnectionId;

/// Arbitrary key-value data collected per connection.
///
/// Independent from the game phase; only read by the engine when revealing.
#[derive(Debug, Default)]
pub struct MetadataStore {
    entries: DashMap<ConnectionId, IndexMap<String, Value>>,
}

impl MetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `entries` into the connection's metadata, overwriting existing keys.
    /// Returns the merged metadata.
    pub fn merge(
        &self,
        connection_id: &ConnectionId,
        entries: IndexMap<String, Value>,
    ) -> IndexMap<String, Value> {
        let mut slot = self.entries.entry(connection_id.clone()).or_default();
        slot.extend(entries);
        slot.clone()
    }

    /// Metadata stored for a connection.
    pub fn get(&self, connection_id: &ConnectionId) -> Option<IndexMap<String, Value>> {
        self.entries
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    /// Forget a connection's metadata.
    pub fn remove(&self, connection_id: &ConnectionId) -> Option<IndexMap<String, Value>> {
        self.entries.remove(connection_id).map(|(_, entries)| entries)
    }
}
