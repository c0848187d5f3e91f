use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with the engine phase and connection counts.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let (phase, players) = state
        .with_engine(|engine| (engine.phase(), engine.registry().len()))
        .await;

    HealthResponse {
        status: "ok".into(),
        phase,
        connections: state.hub().len(),
        players,
    }
}
