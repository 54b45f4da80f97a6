//! Replace the whole schedule with an uploaded file.

use serde_json::Value;
use tracing::info;

use crate::{
    dao::{
        document::{Collection, Payload, WriteBatch, WriteOp},
        models::MatchEntity,
        rules::GuardedStore,
    },
    dto::schedule::{ScheduleEntry, ScheduleUploadResponse},
    error::ServiceError,
    services::{commit_batches, require_admin},
};

/// Prompt the admin must accept before the schedule is replaced.
pub const CONFIRMATION_PROMPT: &str =
    "This will overwrite the current matches collection and clear all results. Continue?";

/// Parse a schedule file: a JSON array of `{round, team1, team2}` objects.
pub fn parse(body: &[u8]) -> Result<Vec<ScheduleEntry>, ServiceError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ServiceError::InvalidInput("Invalid JSON".into()))?;
    let Value::Array(items) = value else {
        return Err(ServiceError::InvalidInput(
            "Invalid format: expected an array".into(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<ScheduleEntry>(item).map_err(|err| {
                ServiceError::InvalidInput(format!("Invalid format: entry {index}: {err}"))
            })
        })
        .collect()
}

/// Delete every match and every result, then insert `entries` with ids `"0"`, `"1"`, ...
///
/// Deletions and inserts run as consecutive batches; a failure leaves earlier batches applied.
pub async fn load(
    store: &GuardedStore,
    body: &[u8],
    confirm: bool,
) -> Result<ScheduleUploadResponse, ServiceError> {
    require_admin(store)?;
    let entries = parse(body)?;
    if !confirm {
        return Err(ServiceError::ConfirmationRequired(CONFIRMATION_PROMPT.into()));
    }

    let old_matches = store.list(Collection::Matches).await?;
    let old_results = store.list(Collection::Results).await?;
    let matches_removed = old_matches.len();
    let results_removed = old_results.len();

    let mut batches = WriteBatch::chunked(old_matches.into_iter().map(|document| WriteOp::Delete {
        collection: Collection::Matches,
        id: document.id,
    }));
    batches.extend(WriteBatch::chunked(old_results.into_iter().map(
        |document| WriteOp::Delete {
            collection: Collection::Results,
            id: document.id,
        },
    )));

    let inserted = entries.len();
    let inserts = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let entity = MatchEntity {
                round: entry.round,
                team1: entry.team1,
                team2: entry.team2,
            };
            Payload::from_entity(&entity)
                .map(|payload| WriteOp::Set {
                    collection: Collection::Matches,
                    id: index.to_string(),
                    payload,
                    merge: false,
                })
                .map_err(|err| ServiceError::InvalidInput(err.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    batches.extend(WriteBatch::chunked(inserts));

    commit_batches(store, batches, "load_schedule").await?;
    info!(inserted, matches_removed, results_removed, "schedule uploaded");

    Ok(ScheduleUploadResponse {
        matches: inserted,
        matches_removed,
        results_removed,
        message: "Schedule uploaded".into(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        dao::document_store::{DocumentStore, memory::MemoryStore},
        services::test_support::{admin, anonymous, seed_schedule},
    };

    #[test]
    fn parse_rejects_invalid_json_and_non_arrays() {
        let err = parse(b"{not json").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(message) if message == "Invalid JSON"));

        let err = parse(br#"{"round": 1}"#).unwrap_err();
        assert!(
            matches!(err, ServiceError::InvalidInput(message) if message == "Invalid format: expected an array")
        );

        let err = parse(br#"[{"round": 1, "team1": "A"}]"#).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(message) if message.contains("entry 0")));
    }

    #[tokio::test]
    async fn upload_replaces_schedule_and_clears_results() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        seed_schedule(&store, &[(1, "W & X", "Y & Z"), (2, "W & Y", "X & Z")]).await;
        store
            .commit(WriteBatch::single(WriteOp::Set {
                collection: Collection::Results,
                id: "1".into(),
                payload: Payload::from_entity(&json!({"set": {"team1": 6, "team2": 2}})).unwrap(),
                merge: false,
            }))
            .await
            .unwrap();

        let body = br#"[{"round":1,"team1":"A & B","team2":"C & D"}]"#;
        let response = load(&admin(store.clone()), body, true).await.unwrap();
        assert_eq!(response.matches, 1);
        assert_eq!(response.matches_removed, 2);
        assert_eq!(response.results_removed, 1);

        let matches = store.list(Collection::Matches).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "0");
        assert_eq!(matches[0].fields["team1"], json!("A & B"));
        assert!(store.list(Collection::Results).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_requires_confirmation_after_validation() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        seed_schedule(&store, &[(1, "A", "B")]).await;

        let err = load(&admin(store.clone()), b"[]", false).await.unwrap_err();
        assert!(matches!(err, ServiceError::ConfirmationRequired(prompt) if prompt == CONFIRMATION_PROMPT));
        assert_eq!(store.list(Collection::Matches).await.unwrap().len(), 1);

        let err = load(&admin(store.clone()), b"nope", false).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn only_admins_upload() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let err = load(&anonymous(store, "anon-1"), b"[]", true)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }
}
