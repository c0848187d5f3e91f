use serde::Serialize;
use utoipa::ToSchema;

use crate::state::engine::GamePhase;

/// Liveness report returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always "ok" while the process serves requests.
    pub status: String,
    /// Phase the game engine is in.
    pub phase: GamePhase,
    /// Open WebSocket connections.
    pub connections: usize,
    /// Connections that registered as players.
    pub players: usize,
}
