use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt, stream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::debug;

use crate::{dto::sse::ServerEvent, state::SharedState};

const KEEP_ALIVE_PERIOD: Duration = Duration::from_secs(15);

/// Subscribe to the mirror of broadcast game events.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.hub().subscribe_mirror()
}

/// Frames for one subscriber: `greeting` first, then every mirrored broadcast.
///
/// The greeting reaches this subscriber only. A subscriber that falls behind skips the
/// events it missed; the next one resyncs it.
pub fn subscriber_frames(
    greeting: ServerEvent,
    receiver: broadcast::Receiver<ServerEvent>,
) -> impl Stream<Item = ServerEvent> + Send + 'static {
    let mirrored = BroadcastStream::new(receiver).filter_map(|item| async move {
        match item {
            Ok(frame) => Some(frame),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                debug!(skipped, "public SSE subscriber lagged");
                None
            }
        }
    });

    stream::once(async move { greeting }).chain(mirrored)
}

/// Turn a mirror subscription into an SSE response opening with `greeting`.
pub fn to_sse_stream(
    greeting: ServerEvent,
    receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = subscriber_frames(greeting, receiver).map(|frame| Ok(into_event(frame)));

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_PERIOD)
            .text("keep-alive"),
    )
}

fn into_event(frame: ServerEvent) -> Event {
    let event = Event::default().data(frame.data);
    match frame.event {
        Some(name) => event.event(name),
        None => event,
    }
}
