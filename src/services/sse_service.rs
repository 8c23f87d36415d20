use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{dto::game::SessionEvent, state::SharedState};

/// Subscribe to the events of every session of the registry.
pub fn subscribe(state: &SharedState) -> broadcast::Receiver<SessionEvent> {
    state.registry().events().subscribe()
}

/// Render a session event as an SSE frame named after the event kind.
pub fn to_event(payload: &SessionEvent) -> Option<Event> {
    match serde_json::to_string(payload) {
        Ok(data) => Some(Event::default().event(payload.name()).data(data)),
        Err(err) => {
            warn!(error = %err, "failed to serialize session event");
            None
        }
    }
}

/// Convert a broadcast receiver into an SSE response, forwarding events of
/// `game_id` (or of every session) until the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<SessionEvent>,
    game_id: Option<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if game_id.is_some_and(|id| id != payload.game_id()) {
                                continue;
                            }
                            let Some(event) = to_event(&payload) else {
                                continue;
                            };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "event stream lagging; skipping events");
                            continue;
                        }
                    }
                }
            }
        }
        info!("event stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use crate::dto::game::PlayerRemoved;

    use super::*;

    #[test]
    fn events_render_with_their_name() {
        let payload = SessionEvent::PlayerRemoved(PlayerRemoved {
            game_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
        });
        assert!(to_event(&payload).is_some());
    }
}
