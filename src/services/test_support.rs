use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::future::BoxFuture;

use crate::{
    dao::{
        document::{Collection, Document, Payload, SnapshotStream, WriteBatch, WriteOp},
        document_store::{DocumentStore, memory::MemoryStore},
        models::MatchEntity,
        rules::GuardedStore,
        storage::{StorageError, StorageResult},
    },
    state::session::{Identity, Role},
};

/// Store that lets a fixed number of commits through and fails every later one.
pub struct FlakyStore {
    inner: MemoryStore,
    remaining: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, successful_commits: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(successful_commits),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("connection reset")]
struct ConnectionReset;

impl DocumentStore for FlakyStore {
    fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        self.inner.get(collection, id)
    }

    fn list(&self, collection: Collection) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        self.inner.list(collection)
    }

    fn commit(&self, batch: WriteBatch) -> BoxFuture<'static, StorageResult<()>> {
        let allowed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if allowed {
            self.inner.commit(batch)
        } else {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "network error".into(),
                    ConnectionReset,
                ))
            })
        }
    }

    fn subscribe(&self, collection: Collection) -> SnapshotStream {
        self.inner.subscribe(collection)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.try_reconnect()
    }
}

pub fn admin(store: Arc<dyn DocumentStore>) -> GuardedStore {
    GuardedStore::new(
        store,
        Identity::signed_in("admin-uid", Some("admin@example.com".into())),
        Role::Admin,
    )
}

pub fn anonymous(store: Arc<dyn DocumentStore>, uid: &str) -> GuardedStore {
    GuardedStore::new(store, Identity::anonymous(uid), Role::Anonymous)
}

/// Store `matches` as the schedule, with positional ids.
pub async fn seed_schedule(store: &Arc<dyn DocumentStore>, matches: &[(i64, &str, &str)]) {
    let mut batch = WriteBatch::new();
    for (index, (round, team1, team2)) in matches.iter().enumerate() {
        let entity = MatchEntity {
            round: *round,
            team1: team1.to_string(),
            team2: team2.to_string(),
        };
        batch
            .push(WriteOp::Set {
                collection: Collection::Matches,
                id: index.to_string(),
                payload: Payload::from_entity(&entity).unwrap(),
                merge: false,
            })
            .unwrap();
    }
    store.commit(batch).await.unwrap();
}
