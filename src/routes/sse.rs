use std::convert::Infallible;

use axum::{
    Router,
    extract::{Query, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{services::sse_service, state::SharedState};

/// Optional filter narrowing the stream to a single session.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Only forward events of this session.
    pub game_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/sse/events",
    tag = "sse",
    params(EventsQuery),
    responses((status = 200, description = "Session event stream", content_type = "text/event-stream", body = String))
)]
/// Stream session events (joins, moves, starts and finishes) as they happen.
pub async fn events_stream(
    State(state): State<SharedState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    info!(game_id = ?query.game_id, "new SSE connection");
    sse_service::to_sse_stream(receiver, query.game_id)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/events", get(events_stream))
}
