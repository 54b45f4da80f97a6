use tracing::debug;

use crate::{
    dao::{document::WriteBatch, rules::GuardedStore},
    error::ServiceError,
};

/// Sign-in, sign-out and anonymous sessions.
pub mod auth_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Live subscriptions feeding the scoreboard caches and the SSE stream.
pub mod live_view;
/// Player directory maintenance.
pub mod player_service;
/// Read-only scoreboard projections.
pub mod public_service;
/// Player rename across every scheduled match.
pub mod rename_service;
/// Result submission, correction and removal.
pub mod result_service;
/// Schedule file import.
pub mod schedule_loader;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Per-player statistics.
pub mod standings;
/// Storage connection supervisor.
pub mod storage_supervisor;
/// Team string encoding.
pub mod team_codec;

#[cfg(test)]
pub(crate) mod test_support;

/// Refuse the operation unless the caller is an admin.
pub(crate) fn require_admin(store: &GuardedStore) -> Result<(), ServiceError> {
    if store.role().is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized("admin privileges required".into()))
    }
}

/// Commit batches one after another. Committed batches stay applied when a later one fails.
pub(crate) async fn commit_batches(
    store: &GuardedStore,
    batches: Vec<WriteBatch>,
    operation: &'static str,
) -> Result<(), ServiceError> {
    let total = batches.len();
    for (index, batch) in batches.into_iter().enumerate() {
        let writes = batch.len();
        if let Err(source) = store.commit(batch).await {
            if index == 0 {
                return Err(source.into());
            }
            return Err(ServiceError::PartialBatch {
                committed: index,
                total,
                source,
            });
        }
        debug!(operation, batch = index + 1, total, writes, "batch committed");
    }
    Ok(())
}
