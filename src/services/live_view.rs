//! Live view binder: keeps the scoreboard caches in sync with the store and pushes every change
//! to SSE subscribers.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        document::{Collection, CollectionSnapshot},
        document_store::DocumentStore,
    },
    dto::sse::ServerEvent,
    services::public_service,
    state::SharedState,
};

/// SSE event name carrying the full scoreboard view.
pub const SCOREBOARD_EVENT: &str = "scoreboard";

/// Cancel every running subscription, then subscribe to the three collections on `store`.
///
/// Each snapshot replaces its cache and triggers a full re-render. The three streams are not
/// ordered relative to each other.
pub async fn restart(state: &SharedState, store: Arc<dyn DocumentStore>) {
    let mut tasks = state.live_tasks().lock().await;
    for task in tasks.drain(..) {
        task.abort();
    }

    for collection in Collection::ALL {
        let mut snapshots = store.subscribe(collection);
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(snapshot) = snapshots.next().await {
                apply_snapshot(&state, &snapshot).await;
                broadcast_view(&state).await;
            }
            warn!(%collection, "live subscription ended");
        }));
    }
    info!("live subscriptions established");
}

/// Cancel every running subscription without starting new ones.
pub async fn stop(state: &SharedState) {
    let mut tasks = state.live_tasks().lock().await;
    for task in tasks.drain(..) {
        task.abort();
    }
}

/// Replace the cache fed by `snapshot`.
pub async fn apply_snapshot(state: &SharedState, snapshot: &CollectionSnapshot) {
    let mut guard = state.scoreboard().write().await;
    match snapshot.collection {
        Collection::Matches => guard.apply_schedule(snapshot),
        Collection::Results => guard.apply_results(snapshot),
        Collection::Players => guard.apply_players(snapshot),
    }
    debug!(
        collection = %snapshot.collection,
        documents = snapshot.documents.len(),
        "snapshot applied"
    );
}

/// Push the anonymous view of the current caches to every SSE subscriber.
pub async fn broadcast_view(state: &SharedState) {
    let view = public_service::get_scoreboard(state, false).await;
    match ServerEvent::json(SCOREBOARD_EVENT, &view) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(error = %err, "failed to serialise scoreboard view"),
    }
}
