/// Countdown tick driver.
pub mod countdown_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game coordination entry points.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Per-connection metadata collection.
pub mod metadata_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
