use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use validator::Validate;

use crate::{
    dto::metadata::{MetadataResponse, MetadataSubmission},
    error::AppError,
    services::metadata_service,
    state::{SharedState, registry::ConnectionId},
};

/// Per-connection metadata collection endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/connections/{id}/metadata",
        post(submit_metadata).get(get_metadata),
    )
}

/// Merge key-value pairs into the metadata of a live connection.
#[utoipa::path(
    post,
    path = "/connections/{id}/metadata",
    tag = "metadata",
    params(("id" = String, Path, description = "Connection identifier received in the `connected` event")),
    request_body = MetadataSubmission,
    responses(
        (status = 200, description = "Metadata after the merge", body = MetadataResponse),
        (status = 400, description = "Empty or oversized submission"),
        (status = 404, description = "Connection is not open")
    )
)]
pub async fn submit_metadata(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<MetadataSubmission>,
) -> Result<Json<MetadataResponse>, AppError> {
    payload.validate()?;
    let response = metadata_service::submit(&state, ConnectionId::from(id), payload).await?;
    Ok(Json(response))
}

/// Read back the metadata stored for a connection.
#[utoipa::path(
    get,
    path = "/connections/{id}/metadata",
    tag = "metadata",
    params(("id" = String, Path, description = "Connection identifier")),
    responses(
        (status = 200, description = "Stored metadata", body = MetadataResponse),
        (status = 404, description = "Nothing stored for this connection")
    )
)]
pub async fn get_metadata(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MetadataResponse>, AppError> {
    Ok(Json(metadata_service::get(&state, ConnectionId::from(id))?))
}
