use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::state::session::{Role, Session};

/// Email and password credentials.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Session bound to the returned token.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Value for the `x-session-token` header.
    pub token: String,
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub anonymous: bool,
    pub role: Role,
    /// `Signed in as {email}` or `Signed in (anonymous viewer)`.
    pub status: String,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        let status = match (&session.identity.email, session.identity.anonymous) {
            (Some(email), false) => format!("Signed in as {email}"),
            _ => "Signed in (anonymous viewer)".to_string(),
        };
        Self {
            token: session.token.clone(),
            uid: session.identity.uid.clone(),
            email: session.identity.email.clone(),
            anonymous: session.identity.anonymous,
            role: session.role,
            status,
        }
    }
}
