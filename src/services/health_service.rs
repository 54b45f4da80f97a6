use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the store and summarise what the live view currently holds.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "document store health check failed");
            }
        }
        Err(_) => warn!("no document store installed"),
    }

    let (matches, results) = {
        let scoreboard = state.scoreboard().read().await;
        (scoreboard.schedule.len(), scoreboard.results.len())
    };

    HealthResponse::new(
        state.is_degraded().await,
        matches,
        results,
        state.sessions().len(),
    )
}
