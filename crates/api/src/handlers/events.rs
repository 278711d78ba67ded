//! Server-Sent Events stream of macro progress.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

/// GET /macros/events
///
/// Streams every macro progress update published after the client
/// connects. The SSE event name is the update kind (`started`, `progress`,
/// `completed`, `failed`); the data is the JSON-encoded event.
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.event_bus.subscribe()).filter_map(|message| async move {
        match message {
            Ok(event) => match Event::default().event(event.update.kind()).json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode macro event");
                    None
                }
            },
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "SSE subscriber lagged, events dropped");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
