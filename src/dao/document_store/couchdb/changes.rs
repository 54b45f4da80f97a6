//! Snapshot subscriptions driven by the CouchDB `_changes` long-poll feed.

use std::time::Duration;

use reqwest::Method;
use tokio::time::sleep;
use tracing::warn;

use crate::dao::document::{Collection, CollectionSnapshot, SnapshotStream};

use super::{
    error::CouchResult,
    models::{ChangesResponse, collection_prefix, seq_token},
    store::CouchDocumentStore,
};

const CHANGES: &str = "_changes";
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Emit the current collection, then a fresh snapshot whenever a document of the collection
/// changes. Feed errors are logged and retried; the stream only ends when dropped.
pub fn watch(store: CouchDocumentStore, collection: Collection) -> SnapshotStream {
    let prefix = collection_prefix(collection);
    Box::pin(async_stream::stream! {
        // Read the sequence before the first listing so nothing committed in between is lost.
        let mut since = loop {
            match store.update_seq().await {
                Ok(seq) => break seq,
                Err(err) => {
                    warn!(%collection, error = %err, "failed to read CouchDB update sequence");
                    sleep(RETRY_DELAY).await;
                }
            }
        };

        let mut pending = true;
        loop {
            if pending {
                match store.list_collection(collection).await {
                    Ok(documents) => {
                        pending = false;
                        yield CollectionSnapshot { collection, documents };
                    }
                    Err(err) => {
                        warn!(%collection, error = %err, "failed to list CouchDB collection");
                        sleep(RETRY_DELAY).await;
                        continue;
                    }
                }
            }

            match poll_changes(&store, &since).await {
                Ok(changes) => {
                    since = seq_token(&changes.last_seq);
                    pending = changes.results.iter().any(|row| row.id.starts_with(&prefix));
                }
                Err(err) => {
                    warn!(%collection, error = %err, "CouchDB changes feed failed; retrying");
                    sleep(RETRY_DELAY).await;
                }
            }
        }
    })
}

async fn poll_changes(store: &CouchDocumentStore, since: &str) -> CouchResult<ChangesResponse> {
    let query = [
        ("feed", "longpoll".to_string()),
        ("since", since.to_string()),
        ("timeout", store.changes_timeout_ms.to_string()),
    ];
    store
        .send_json(
            store
                .request(Method::GET, store.url(&[CHANGES])?)
                .query(&query),
            CHANGES,
        )
        .await
}
