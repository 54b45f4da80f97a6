use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    error::AppError,
    services::auth_service,
    state::{SharedState, session::Session},
};

/// Header carrying the session token returned by the `/auth` routes.
pub const SESSION_HEADER: &str = "x-session-token";

fn session_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// Session of the caller when a valid token was sent.
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|session| session.role.is_admin())
    }
}

impl FromRequestParts<SharedState> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(auth_service::resolve(state, session_token(parts))))
    }
}

/// Session of the caller; requests without a valid token are rejected.
pub struct RequireSession(pub Session);

impl FromRequestParts<SharedState> for RequireSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(Self(session.clone()));
        }
        let token = session_token(parts).ok_or_else(|| {
            AppError::Unauthorized(format!("missing session header `{SESSION_HEADER}`"))
        })?;
        auth_service::resolve(state, Some(token))
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("unknown or expired session".into()))
    }
}
