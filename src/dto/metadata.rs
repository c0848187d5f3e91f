//! DTOs for the per-connection metadata collection endpoint.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{dto::validation::validate_metadata_entries, state::registry::ConnectionId};

/// Key-value pairs to merge into a connection's metadata.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MetadataSubmission {
    /// Entries to store; existing keys are overwritten.
    #[schema(value_type = Object)]
    pub entries: IndexMap<String, Value>,
}

impl Validate for MetadataSubmission {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_metadata_entries(&self.entries) {
            errors.add("entries", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Metadata currently stored for a connection.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    pub connection_id: ConnectionId,
    #[schema(value_type = Object)]
    pub entries: IndexMap<String, Value>,
}
