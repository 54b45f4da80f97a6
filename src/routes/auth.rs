use axum::{Json, Router, extract::State, routing::{get, post}};
use axum_valid::Valid;

use crate::{
    dto::auth::{SessionResponse, SignInRequest},
    error::AppError,
    routes::extract::{MaybeSession, RequireSession},
    services::auth_service,
    state::SharedState,
};

/// Session management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/anonymous", post(anonymous))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/me", get(me))
}

/// Open a session for an anonymous viewer.
#[utoipa::path(
    post,
    path = "/auth/anonymous",
    tag = "auth",
    responses((status = 200, description = "Anonymous session opened", body = SessionResponse))
)]
pub async fn anonymous(State(state): State<SharedState>) -> Json<SessionResponse> {
    let session = auth_service::open_anonymous(&state);
    Json(SessionResponse::from(&session))
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Sign-in failed")
    )
)]
pub async fn sign_in(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SignInRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = auth_service::sign_in(&state, &payload.email, &payload.password)?;
    Ok(Json(SessionResponse::from(&session)))
}

/// Close the current session and continue anonymously.
#[utoipa::path(
    post,
    path = "/auth/sign-out",
    tag = "auth",
    params(("x-session-token" = Option<String>, Header, description = "Session to close")),
    responses((status = 200, description = "Signed out; a fresh anonymous session is returned", body = SessionResponse))
)]
pub async fn sign_out(
    State(state): State<SharedState>,
    MaybeSession(session): MaybeSession,
) -> Json<SessionResponse> {
    let token = session.as_ref().map(|session| session.token.as_str());
    let next = auth_service::sign_out(&state, token);
    Json(SessionResponse::from(&next))
}

/// Describe the caller's session.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    params(("x-session-token" = String, Header, description = "Session token")),
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "No session")
    )
)]
pub async fn me(RequireSession(session): RequireSession) -> Json<SessionResponse> {
    Json(SessionResponse::from(&session))
}
