use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::game::{GameSnapshot, PlayerSummary},
    services::game_service,
    state::SharedState,
};

/// Read-only views of the running game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", get(get_game))
        .route("/players", get(list_players))
}

/// Current phase, round and countdown. Never includes the answer.
#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses(
        (status = 200, description = "Current game snapshot", body = GameSnapshot)
    )
)]
pub async fn get_game(State(state): State<SharedState>) -> Json<GameSnapshot> {
    Json(game_service::snapshot(&state).await)
}

/// Registered participants in join order.
#[utoipa::path(
    get,
    path = "/players",
    tag = "game",
    responses(
        (status = 200, description = "Registered participants", body = [PlayerSummary])
    )
)]
pub async fn list_players(State(state): State<SharedState>) -> Json<Vec<PlayerSummary>> {
    Json(game_service::players(&state).await)
}
