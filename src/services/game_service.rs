//! Game coordination entry points shared by the WebSocket transport, the REST routes
//! and tests. Every operation runs against the engine under its lock.

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    dto::{
        game::{GameSnapshot, PlayerSummary},
        ws::{ClientMessage, ConnectedEvent, ServerMessage},
    },
    error::ServiceError,
    state::{ClientConnection, SharedState, engine::Notifier, registry::ConnectionId},
};

/// Attach a new client: allocate its id, start delivering broadcasts to `tx`, and
/// greet it with its id, the current game snapshot and the participant list.
///
/// Attaching happens under the engine lock, so no broadcast can slip in ahead of
/// the greeting.
pub async fn open_connection(
    state: &SharedState,
    tx: mpsc::UnboundedSender<Message>,
) -> ConnectionId {
    let connection_id = ConnectionId::generate();
    state
        .with_engine(|engine| {
            let hub = state.hub();
            hub.insert(ClientConnection {
                id: connection_id.clone(),
                tx,
            });
            hub.unicast(
                &connection_id,
                &ServerMessage::Connected(ConnectedEvent {
                    connection_id: connection_id.clone(),
                }),
            );
            hub.unicast(&connection_id, &ServerMessage::GameState(engine.snapshot()));
            hub.unicast(&connection_id, &ServerMessage::PlayersUpdate(engine.players()));
        })
        .await;

    info!(id = %connection_id, connections = state.hub().len(), "client connected");
    connection_id
}

/// Detach a client: stop delivering to it and drop its participant entry and guess.
///
/// Collected metadata is forgotten unless the configuration retains it. Both happen
/// under the engine lock so a concurrent metadata submission either lands before the
/// teardown or is rejected.
pub async fn close_connection(state: &SharedState, connection_id: &ConnectionId) {
    let discarded = state
        .with_engine(|engine| {
            state.hub().remove(connection_id);
            engine.remove(connection_id);
            !state.config().retain_metadata_on_disconnect
                && state.metadata().remove(connection_id).is_some()
        })
        .await;

    if discarded {
        debug!(id = %connection_id, "discarded connection metadata");
    }

    info!(id = %connection_id, connections = state.hub().len(), "client disconnected");
}

/// Apply one inbound protocol message on behalf of `connection_id`.
pub async fn handle_client_message(
    state: &SharedState,
    connection_id: &ConnectionId,
    message: ClientMessage,
) -> Result<(), ServiceError> {
    match message {
        ClientMessage::RegisterPlayer(payload) => {
            let name = payload.name.trim().to_string();
            state
                .with_engine(|engine| engine.register(connection_id.clone(), name, payload.device))
                .await;
        }
        ClientMessage::SubmitGuess(guess) => {
            state
                .with_engine(|engine| engine.submit_guess(connection_id, guess.lat, guess.lng))
                .await;
        }
        ClientMessage::StartGame => {
            state
                .with_engine(|engine| engine.start_game(connection_id))
                .await?;
        }
        ClientMessage::NextRound => {
            state
                .with_engine(|engine| engine.advance_round(connection_id))
                .await;
        }
        ClientMessage::RevealPrivateData => {
            state
                .with_engine(|engine| engine.reveal_private_data(state.metadata()))
                .await;
        }
        ClientMessage::ReturnToLobby => {
            state.with_engine(|engine| engine.return_to_lobby()).await;
        }
    }
    Ok(())
}

/// Current game snapshot.
pub async fn snapshot(state: &SharedState) -> GameSnapshot {
    state.with_engine(|engine| engine.snapshot()).await
}

/// Registered participants in join order.
pub async fn players(state: &SharedState) -> Vec<PlayerSummary> {
    state.with_engine(|engine| engine.players()).await
}
