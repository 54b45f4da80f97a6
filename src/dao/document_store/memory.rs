//! In-process document store used when no external database is configured, and as the test double.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::sync::{
    RwLock,
    broadcast::{self, error::RecvError},
};
use tracing::debug;

use crate::dao::{
    document::{
        Collection, CollectionSnapshot, Document, Fields, SnapshotStream, WriteBatch, server_now,
        sort_documents,
    },
    document_store::DocumentStore,
    storage::StorageResult,
};

type Collections = HashMap<Collection, BTreeMap<String, Fields>>;

/// Document store keeping every collection in memory.
///
/// A batch is validated against a staged copy and swapped in under one write lock, so either
/// every write of the batch lands or none does.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    collections: RwLock<Collections>,
    changes: broadcast::Sender<Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _receiver) = broadcast::channel(64);
        Self {
            inner: Arc::new(MemoryInner {
                collections: RwLock::new(HashMap::new()),
                changes,
            }),
        }
    }

    async fn snapshot(&self, collection: Collection) -> CollectionSnapshot {
        let guard = self.inner.collections.read().await;
        let mut documents: Vec<Document> = guard
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        sort_documents(collection, &mut documents);
        CollectionSnapshot {
            collection,
            documents,
        }
    }

    async fn apply(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let now = server_now();
        let mut touched = Vec::new();
        {
            let mut guard = self.inner.collections.write().await;
            let mut staged = guard.clone();
            for op in batch.into_ops() {
                let collection = op.collection();
                op.apply_to(staged.entry(collection).or_default(), &now)?;
                if !touched.contains(&collection) {
                    touched.push(collection);
                }
            }
            *guard = staged;
        }

        debug!(collections = ?touched, "memory batch committed");
        for collection in touched {
            let _ = self.inner.changes.send(collection);
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let store = self.clone();
        let id = id.to_string();
        Box::pin(async move {
            let guard = store.inner.collections.read().await;
            Ok(guard
                .get(&collection)
                .and_then(|docs| docs.get(&id))
                .map(|fields| Document::new(id.clone(), fields.clone())))
        })
    }

    fn list(&self, collection: Collection) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.snapshot(collection).await.documents) })
    }

    fn commit(&self, batch: WriteBatch) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.apply(batch).await })
    }

    fn subscribe(&self, collection: Collection) -> SnapshotStream {
        let store = self.clone();
        // Subscribe before reading the first snapshot so no commit slips between the two.
        let mut changes = self.inner.changes.subscribe();
        Box::pin(async_stream::stream! {
            yield store.snapshot(collection).await;
            loop {
                match changes.recv().await {
                    Ok(changed) if changed == collection => {
                        yield store.snapshot(collection).await;
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(_)) => {
                        yield store.snapshot(collection).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
