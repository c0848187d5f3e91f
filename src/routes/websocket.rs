use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::get,
};

use crate::{services::websocket_service, state::SharedState};

/// Game socket endpoint shared by players, hosts and projectors.
pub fn router() -> Router<SharedState> {
    Router::new().route("/ws", get(ws_handler))
}

/// Upgrade to a game WebSocket. The first frame sent back is the `connected` event.
#[utoipa::path(
    get,
    path = "/ws",
    tag = "game",
    responses((status = 101, description = "Switching protocols to the game WebSocket"))
)]
pub async fn ws_handler(State(state): State<SharedState>, upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(move |socket| websocket_service::handle_socket(state, socket))
}
