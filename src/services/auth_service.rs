//! Sessions: anonymous viewers, email + password sign-in and sign-out.

use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    state::{
        SharedState,
        session::{Identity, Role, Session},
    },
};

/// Sessions unused for this long are dropped.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Open a session for a fresh anonymous identity.
pub fn open_anonymous(state: &SharedState) -> Session {
    let identity = Identity::anonymous(Uuid::new_v4().to_string());
    let session = state.sessions().open(identity, Role::Anonymous);
    info!(uid = %session.identity.uid, "anonymous session opened");
    session
}

/// Check credentials against the configured accounts and open a session with the resolved role.
pub fn sign_in(state: &SharedState, email: &str, password: &str) -> Result<Session, ServiceError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ServiceError::InvalidInput(
            "Enter email and password".into(),
        ));
    }

    let Some(account) = state.config().find_account(email, password) else {
        warn!(email, "sign-in rejected");
        return Err(ServiceError::Unauthorized(
            "Sign-in failed: invalid email or password".into(),
        ));
    };

    let identity = Identity::signed_in(account.uid.clone(), Some(account.email.clone()));
    let role = state.config().role_for(&identity);
    let session = state.sessions().open(identity, role);
    info!(uid = %session.identity.uid, ?role, "signed in");
    Ok(session)
}

/// Drop the caller's session and hand out a new anonymous one.
pub fn sign_out(state: &SharedState, token: Option<&str>) -> Session {
    if let Some(closed) = token.and_then(|token| state.sessions().close(token)) {
        info!(uid = %closed.identity.uid, "signed out");
    }
    open_anonymous(state)
}

/// Session bound to `token`, if any.
pub fn resolve(state: &SharedState, token: Option<&str>) -> Option<Session> {
    token.and_then(|token| state.sessions().get(token))
}

/// Drop idle sessions every few minutes, for the lifetime of the server.
pub async fn run_session_sweeper(state: SharedState) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let expired = state.sessions().expire_idle(SESSION_IDLE_TIMEOUT);
        if expired > 0 {
            info!(expired, remaining = state.sessions().len(), "idle sessions expired");
        } else {
            debug!(remaining = state.sessions().len(), "no idle sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Account, AppConfig},
        state::AppState,
    };

    fn state() -> SharedState {
        AppState::new(AppConfig::new(
            vec!["uid-admin".into()],
            vec!["boss@example.com".into()],
            vec![
                Account {
                    email: "admin@example.com".into(),
                    password: "secret".into(),
                    uid: "uid-admin".into(),
                },
                Account {
                    email: "boss@example.com".into(),
                    password: "hunter2".into(),
                    uid: "uid-boss".into(),
                },
                Account {
                    email: "fan@example.com".into(),
                    password: "pw".into(),
                    uid: "uid-fan".into(),
                },
            ],
        ))
    }

    #[test]
    fn roles_come_from_the_allow_lists() {
        let state = state();
        assert_eq!(
            sign_in(&state, "admin@example.com", "secret").unwrap().role,
            Role::Admin
        );
        assert_eq!(
            sign_in(&state, " boss@example.com ", "hunter2").unwrap().role,
            Role::Admin
        );
        assert_eq!(
            sign_in(&state, "fan@example.com", "pw").unwrap().role,
            Role::Authenticated
        );
        assert_eq!(open_anonymous(&state).role, Role::Anonymous);
    }

    #[test]
    fn bad_credentials_are_rejected() {
        let state = state();
        assert!(matches!(
            sign_in(&state, "admin@example.com", "nope"),
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            sign_in(&state, "", "secret"),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn sign_out_replaces_the_session_with_an_anonymous_one() {
        let state = state();
        let admin = sign_in(&state, "admin@example.com", "secret").unwrap();
        let next = sign_out(&state, Some(&admin.token));

        assert!(resolve(&state, Some(&admin.token)).is_none());
        assert_eq!(next.role, Role::Anonymous);
        assert_eq!(resolve(&state, Some(&next.token)), Some(next));
    }
}
