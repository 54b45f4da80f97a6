use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};

use crate::{
    dto::results::{SubmitResultRequest, SubmitResultResponse},
    error::AppError,
    routes::extract::RequireSession,
    services::result_service,
    state::SharedState,
};

/// Result submission, open to every session.
pub fn router() -> Router<SharedState> {
    Router::new().route("/results/{match_id}", post(submit_result))
}

/// Record the result of a match. Non-admins can only record a match once.
#[utoipa::path(
    post,
    path = "/results/{match_id}",
    tag = "results",
    params(
        ("x-session-token" = String, Header, description = "Session token"),
        ("match_id" = String, Path, description = "Match the result belongs to")
    ),
    request_body = SubmitResultRequest,
    responses(
        (status = 200, description = "Result recorded", body = SubmitResultResponse),
        (status = 400, description = "Invalid or tied scores"),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "A result is already recorded for this match")
    )
)]
pub async fn submit_result(
    State(state): State<SharedState>,
    RequireSession(session): RequireSession,
    Path(match_id): Path<String>,
    Json(payload): Json<SubmitResultRequest>,
) -> Result<Json<SubmitResultResponse>, AppError> {
    let store = state.guarded_store(&session).await?;
    Ok(Json(
        result_service::submit_result(&store, &match_id, &payload).await?,
    ))
}
