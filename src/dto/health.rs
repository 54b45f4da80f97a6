use serde::Serialize;
use utoipa::ToSchema;

/// Liveness payload for `/healthcheck`, with a glance at the cached scoreboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` while a document store is installed, `degraded` otherwise.
    pub status: String,
    /// Matches currently held by the live view.
    pub matches: usize,
    /// Recorded results currently held by the live view.
    pub results: usize,
    /// Open viewer and admin sessions.
    pub sessions: usize,
}

impl HealthResponse {
    pub fn new(degraded: bool, matches: usize, results: usize, sessions: usize) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_string(),
            matches,
            results,
            sessions,
        }
    }
}
