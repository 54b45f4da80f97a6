use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::scoreboard::{MatchDetail, MatchRow, ScoreboardView, StandingRow},
    error::AppError,
    routes::extract::MaybeSession,
    services::public_service,
    state::SharedState,
};

/// Public read-only endpoints that expose the live scoreboard.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/scoreboard", get(get_scoreboard))
        .route("/public/matches", get(get_matches))
        .route("/public/matches/{id}", get(get_match))
        .route("/public/standings", get(get_standings))
}

/// Return the full scoreboard view.
#[utoipa::path(
    get,
    path = "/public/scoreboard",
    tag = "public",
    params(("x-session-token" = Option<String>, Header, description = "Session token; admins see clear actions")),
    responses((status = 200, description = "Match picker, matches table and standings", body = ScoreboardView))
)]
pub async fn get_scoreboard(
    State(state): State<SharedState>,
    session: MaybeSession,
) -> Json<ScoreboardView> {
    Json(public_service::get_scoreboard(&state, session.is_admin()).await)
}

/// Return the matches table.
#[utoipa::path(
    get,
    path = "/public/matches",
    tag = "public",
    params(("x-session-token" = Option<String>, Header, description = "Session token; admins see clear actions")),
    responses((status = 200, description = "Scheduled matches with their results", body = [MatchRow]))
)]
pub async fn get_matches(
    State(state): State<SharedState>,
    session: MaybeSession,
) -> Json<Vec<MatchRow>> {
    Json(public_service::get_matches(&state, session.is_admin()).await)
}

/// Return one match with the result to prefill the score editor.
#[utoipa::path(
    get,
    path = "/public/matches/{id}",
    tag = "public",
    params(("id" = String, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match and its current result", body = MatchDetail),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MatchDetail>, AppError> {
    Ok(Json(public_service::get_match(&state, &id).await?))
}

/// Return the ranked standings.
#[utoipa::path(
    get,
    path = "/public/standings",
    tag = "public",
    responses((status = 200, description = "Ranked standings", body = [StandingRow]))
)]
pub async fn get_standings(State(state): State<SharedState>) -> Json<Vec<StandingRow>> {
    Json(public_service::get_standings(&state).await)
}
