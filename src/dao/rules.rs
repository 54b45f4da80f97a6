//! Role-based write rules applied beneath the services.
//!
//! Services only reach the store through a [`GuardedStore`], so the "anonymous may create a
//! result but never change one" guarantee does not depend on any service-side check.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    dao::{
        document::{Collection, Document, WriteBatch, WriteOp},
        document_store::DocumentStore,
        models::fields,
        storage::{StorageError, StorageResult},
    },
    state::session::{Identity, Role},
};

/// Check a single write against the caller's role.
pub fn check_write(identity: &Identity, role: Role, op: &WriteOp) -> StorageResult<()> {
    if role == Role::Admin {
        return Ok(());
    }

    match op {
        WriteOp::Create {
            collection: Collection::Results,
            payload,
            ..
        } if payload.fields().get(fields::SUBMITTED_BY)
            == Some(&Value::String(identity.uid.clone())) =>
        {
            Ok(())
        }
        other => Err(StorageError::PermissionDenied {
            collection: other.collection(),
            id: other.id().to_string(),
        }),
    }
}

/// Document store handle bound to one caller.
#[derive(Clone)]
pub struct GuardedStore {
    inner: Arc<dyn DocumentStore>,
    identity: Identity,
    role: Role,
}

impl GuardedStore {
    pub fn new(inner: Arc<dyn DocumentStore>, identity: Identity, role: Role) -> Self {
        Self {
            inner,
            identity,
            role,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub async fn get(&self, collection: Collection, id: &str) -> StorageResult<Option<Document>> {
        self.inner.get(collection, id).await
    }

    pub async fn list(&self, collection: Collection) -> StorageResult<Vec<Document>> {
        self.inner.list(collection).await
    }

    /// Commit the batch if every write is allowed; one refused write rejects the whole batch.
    pub async fn commit(&self, batch: WriteBatch) -> StorageResult<()> {
        for op in batch.ops() {
            check_write(&self.identity, self.role, op)?;
        }
        self.inner.commit(batch).await
    }

    /// Commit a single write.
    pub async fn write(&self, op: WriteOp) -> StorageResult<()> {
        self.commit(WriteBatch::single(op)).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dao::{document::Payload, document_store::memory::MemoryStore};

    fn result_payload(submitted_by: &str) -> Payload {
        match json!({"set": {"team1": 6, "team2": 3}, "winnerTeam": "team1", "submittedBy": submitted_by}) {
            Value::Object(map) => Payload::new(map),
            _ => unreachable!(),
        }
    }

    fn anonymous() -> Identity {
        Identity::anonymous("anon-1")
    }

    #[test]
    fn anonymous_may_only_create_own_results() {
        let identity = anonymous();
        let create = WriteOp::Create {
            collection: Collection::Results,
            id: "0".into(),
            payload: result_payload("anon-1"),
        };
        assert!(check_write(&identity, Role::Anonymous, &create).is_ok());

        let spoofed = WriteOp::Create {
            collection: Collection::Results,
            id: "0".into(),
            payload: result_payload("someone-else"),
        };
        assert!(check_write(&identity, Role::Anonymous, &spoofed).is_err());

        let overwrite = WriteOp::Set {
            collection: Collection::Results,
            id: "0".into(),
            payload: result_payload("anon-1"),
            merge: true,
        };
        assert!(check_write(&identity, Role::Authenticated, &overwrite).is_err());

        let delete = WriteOp::Delete {
            collection: Collection::Results,
            id: "0".into(),
        };
        assert!(check_write(&identity, Role::Anonymous, &delete).is_err());
    }

    #[test]
    fn non_admins_never_touch_matches_or_players() {
        let identity = anonymous();
        let create_match = WriteOp::Create {
            collection: Collection::Matches,
            id: "0".into(),
            payload: result_payload("anon-1"),
        };
        let err = check_write(&identity, Role::Authenticated, &create_match).unwrap_err();
        assert!(matches!(err, StorageError::PermissionDenied { .. }));

        let player = WriteOp::Delete {
            collection: Collection::Players,
            id: "Alice".into(),
        };
        assert!(check_write(&identity, Role::Anonymous, &player).is_err());
        assert!(check_write(&identity, Role::Admin, &player).is_ok());
    }

    #[tokio::test]
    async fn refused_write_rejects_the_whole_batch() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let guarded = GuardedStore::new(store.clone(), anonymous(), Role::Anonymous);

        let mut batch = WriteBatch::new();
        batch
            .push(WriteOp::Create {
                collection: Collection::Results,
                id: "0".into(),
                payload: result_payload("anon-1"),
            })
            .unwrap();
        batch
            .push(WriteOp::Delete {
                collection: Collection::Results,
                id: "1".into(),
            })
            .unwrap();

        assert!(guarded.commit(batch).await.is_err());
        assert!(store.list(Collection::Results).await.unwrap().is_empty());
    }
}
