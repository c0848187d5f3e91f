use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{dto::sse::ServerEvent, services::sse_service, state::SharedState};

/// Read-only event streams.
pub fn router() -> Router<SharedState> {
    Router::new().route("/sse/public", get(public_stream))
}

/// Mirror of every broadcast game event, for projector screens.
///
/// Opens with an `info` greeting addressed to this subscriber only. Unicast events
/// (`connected`, `game-state`, `private-data`, `error`) never appear here.
#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    responses((
        status = 200,
        description = "Broadcast game events",
        content_type = "text/event-stream",
        body = String
    ))
)]
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe_public(&state);
    info!(connections = state.hub().len(), "projector subscribed to public stream");
    sse_service::to_sse_stream(ServerEvent::info("public stream connected"), receiver)
}
