//! Per-connection metadata collection. Independent from the game phase.

use tracing::debug;

use crate::{
    dto::metadata::{MetadataResponse, MetadataSubmission},
    error::ServiceError,
    state::{SharedState, registry::ConnectionId},
};

/// Merge a submission into the metadata of a live connection.
///
/// Runs under the engine lock, the same lock `close_connection` tears connections
/// down under, so a submission can never land after its connection's metadata was
/// discarded.
pub async fn submit(
    state: &SharedState,
    connection_id: ConnectionId,
    submission: MetadataSubmission,
) -> Result<MetadataResponse, ServiceError> {
    let count = submission.entries.len();
    let entries = state
        .with_engine(|_| {
            state
                .hub()
                .contains(&connection_id)
                .then(|| state.metadata().merge(&connection_id, submission.entries))
        })
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("connection `{connection_id}` not found")))?;

    debug!(id = %connection_id, added = count, total = entries.len(), "metadata stored");

    Ok(MetadataResponse {
        connection_id,
        entries,
    })
}

/// Metadata stored for a connection, live or retained after disconnect.
pub fn get(
    state: &SharedState,
    connection_id: ConnectionId,
) -> Result<MetadataResponse, ServiceError> {
    let entries = state.metadata().get(&connection_id).ok_or_else(|| {
        ServiceError::NotFound(format!("no metadata for connection `{connection_id}`"))
    })?;

    Ok(MetadataResponse {
        connection_id,
        entries,
    })
}
