use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

/// Stream the live scoreboard to connected frontends.
#[utoipa::path(
    get,
    path = "/sse/scoreboard",
    tag = "sse",
    responses((status = 200, description = "`scoreboard` events carrying the full view after every change", content_type = "text/event-stream", body = String))
)]
pub async fn scoreboard_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (latest, receiver) = sse_service::subscribe_scoreboard(&state);
    info!("New scoreboard SSE connection");
    sse_service::to_sse_stream(latest, receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/scoreboard", get(scoreboard_stream))
}
