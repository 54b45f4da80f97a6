use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod auth;
pub mod docs;
pub mod extract;
pub mod health;
pub mod public;
pub mod results;
pub mod sse;

/// Every route tree of the scoreboard backend, Swagger UI included.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(sse::router())
        .merge(auth::router())
        .merge(public::router())
        .merge(results::router())
        .merge(admin::router(state.clone()))
        .merge(docs::router())
        .with_state(state)
}
