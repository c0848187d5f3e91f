use utoipa::OpenApi;

#[derive(OpenApi)]
/// OpenAPI document of the HTTP surface.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::game::get_game,
        crate::routes::game::list_players,
        crate::routes::metadata::submit_metadata,
        crate::routes::metadata::get_metadata,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::GameSnapshot,
            crate::dto::game::PlayerSummary,
            crate::dto::metadata::MetadataSubmission,
            crate::dto::metadata::MetadataResponse,
            crate::dto::ws::RegisterPlayer,
            crate::dto::ws::SubmitGuess,
            crate::dto::ws::ServerMessage,
            crate::state::engine::GamePhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "game", description = "Game WebSocket and read-only game state"),
        (name = "metadata", description = "Per-connection metadata collection"),
    )
)]
pub struct ApiDoc;
