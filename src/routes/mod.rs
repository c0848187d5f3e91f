use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod game;
pub mod health;
pub mod metadata;
pub mod sse;
pub mod websocket;

/// Every HTTP, SSE and WebSocket route bound to the shared state.
pub fn router(state: SharedState) -> Router<()> {
    Router::new()
        .merge(health::router())
        .merge(game::router())
        .merge(metadata::router())
        .merge(websocket::router())
        .merge(sse::router())
        .merge(docs::router())
        .with_state(state)
}
