use std::ops::ControlFlow;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    dto::ws::ClientMessage,
    services::game_service,
    state::{SharedState, registry::ConnectionId},
};

/// Drive one game socket from upgrade to close.
///
/// Outbound frames go through a per-connection queue drained by a writer task, so
/// broadcasts never wait on this socket's reads.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (sink, mut stream) = socket.split();
    let (outbound, queue) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(sink, queue));

    let connection_id = game_service::open_connection(&state, outbound.clone()).await;

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                warn!(id = %connection_id, error = %err, "websocket read failed");
                break;
            }
        };
        if on_frame(&state, &connection_id, &outbound, frame)
            .await
            .is_break()
        {
            break;
        }
    }

    game_service::close_connection(&state, &connection_id).await;

    // The hub dropped its sender on close; dropping ours lets the writer drain and exit.
    drop(outbound);
    if let Err(err) = writer.await {
        debug!(id = %connection_id, error = %err, "websocket writer ended abnormally");
    }
}

async fn on_frame(
    state: &SharedState,
    connection_id: &ConnectionId,
    outbound: &mpsc::UnboundedSender<Message>,
    frame: Message,
) -> ControlFlow<()> {
    match frame {
        Message::Text(text) => {
            let message = match ClientMessage::from_json_str(text.as_str()) {
                Ok(message) => message,
                Err(err) => {
                    warn!(id = %connection_id, error = %err, "rejected client frame");
                    return ControlFlow::Continue(());
                }
            };
            if let Err(err) =
                game_service::handle_client_message(state, connection_id, message).await
            {
                warn!(id = %connection_id, error = %err, "client command failed");
            }
        }
        Message::Ping(payload) => {
            let _ = outbound.send(Message::Pong(payload));
        }
        Message::Close(frame) => {
            info!(id = %connection_id, "client closed the socket");
            let _ = outbound.send(Message::Close(frame));
            return ControlFlow::Break(());
        }
        Message::Binary(_) | Message::Pong(_) => {}
    }
    ControlFlow::Continue(())
}

async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut queue: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(frame) = queue.recv().await {
        if sink.send(frame).await.is_err() {
            break;
        }
    }
}
