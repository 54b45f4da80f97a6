//! Store-agnostic document model: collections, write operations, atomic batches and snapshots.

use std::{cmp::Ordering, fmt, time::SystemTime};

use futures::stream::BoxStream;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::dao::storage::{StorageError, StorageResult};

/// Ceiling on the number of writes a single atomic batch may carry.
pub const MAX_BATCH_WRITES: usize = 400;

/// Field map of a stored document.
pub type Fields = Map<String, Value>;

/// Stream of full-collection snapshots, the first one describing the current content.
pub type SnapshotStream = BoxStream<'static, CollectionSnapshot>;

/// Collections known to the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Match schedule, keyed by positional id.
    Matches,
    /// Recorded results, keyed by match id.
    Results,
    /// Player directory, keyed by display name.
    Players,
}

impl Collection {
    /// Every collection, in subscription order.
    pub const ALL: [Collection; 3] = [Collection::Matches, Collection::Results, Collection::Players];

    /// Name used by the backends to namespace documents.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Matches => "matches",
            Collection::Results => "results",
            Collection::Players => "players",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored document: its id within the collection and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Id within the collection, e.g. `"0"` for the first scheduled match.
    pub id: String,
    /// Top-level JSON fields.
    pub fields: Fields,
}

impl Document {
    /// Document `id` holding `fields`.
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode the fields into a typed entity.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

/// Fields to write, plus the names of the fields the store stamps with its own clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    fields: Fields,
    server_timestamps: Vec<&'static str>,
}

impl Payload {
    /// Payload written as-is, without server timestamps.
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    /// Serialise an entity into a payload. The entity must serialise to a JSON object.
    pub fn from_entity<T: Serialize>(entity: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(entity)? {
            Value::Object(fields) => Ok(Self::new(fields)),
            other => Err(serde::ser::Error::custom(format!(
                "document payload must be an object, got {other}"
            ))),
        }
    }

    /// Ask the store to fill `field` with the commit time.
    pub fn with_server_timestamp(mut self, field: &'static str) -> Self {
        self.fields.remove(field);
        self.server_timestamps.push(field);
        self
    }

    /// Fields supplied by the caller.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Produce the final field map, stamping server timestamps with `now`.
    pub fn resolve(self, now: &str) -> Fields {
        let mut fields = self.fields;
        for field in self.server_timestamps {
            fields.insert(field.to_string(), Value::String(now.to_string()));
        }
        fields
    }
}

/// A single document write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create-only write: fails when the id already exists.
    Create {
        collection: Collection,
        id: String,
        payload: Payload,
    },
    /// Create-or-replace write; `merge` keeps fields the payload does not mention.
    Set {
        collection: Collection,
        id: String,
        payload: Payload,
        merge: bool,
    },
    /// Merge into an existing document; fails when the document is absent.
    Update {
        collection: Collection,
        id: String,
        payload: Payload,
    },
    /// Remove a document. Deleting an absent document is a no-op.
    Delete { collection: Collection, id: String },
}

impl WriteOp {
    pub fn collection(&self) -> Collection {
        match self {
            WriteOp::Create { collection, .. }
            | WriteOp::Set { collection, .. }
            | WriteOp::Update { collection, .. }
            | WriteOp::Delete { collection, .. } => *collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WriteOp::Create { id, .. }
            | WriteOp::Set { id, .. }
            | WriteOp::Update { id, .. }
            | WriteOp::Delete { id, .. } => id,
        }
    }

    /// Apply the write to a collection's documents, honouring create/update preconditions.
    pub fn apply_to(
        self,
        documents: &mut std::collections::BTreeMap<String, Fields>,
        now: &str,
    ) -> StorageResult<()> {
        match self {
            WriteOp::Create {
                collection,
                id,
                payload,
            } => {
                if documents.contains_key(&id) {
                    return Err(StorageError::AlreadyExists { collection, id });
                }
                documents.insert(id, payload.resolve(now));
            }
            WriteOp::Set {
                id, payload, merge, ..
            } => {
                let fields = payload.resolve(now);
                match documents.get_mut(&id) {
                    Some(existing) if merge => existing.extend(fields),
                    _ => {
                        documents.insert(id, fields);
                    }
                }
            }
            WriteOp::Update {
                collection,
                id,
                payload,
            } => match documents.get_mut(&id) {
                Some(existing) => existing.extend(payload.resolve(now)),
                None => return Err(StorageError::NotFound { collection, id }),
            },
            WriteOp::Delete { id, .. } => {
                documents.remove(&id);
            }
        }
        Ok(())
    }
}

/// Ordered group of writes committed atomically, bounded by [`MAX_BATCH_WRITES`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch holding one write.
    pub fn single(op: WriteOp) -> Self {
        Self { ops: vec![op] }
    }

    /// Append a write, refusing once the batch is full.
    pub fn push(&mut self, op: WriteOp) -> StorageResult<()> {
        if self.ops.len() >= MAX_BATCH_WRITES {
            return Err(StorageError::BatchFull {
                limit: MAX_BATCH_WRITES,
            });
        }
        self.ops.push(op);
        Ok(())
    }

    /// Number of writes queued.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether no write is queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Queued writes in commit order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Take the queued writes.
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Split `ops` into consecutive full batches, the last one possibly shorter.
    pub fn chunked(ops: impl IntoIterator<Item = WriteOp>) -> Vec<WriteBatch> {
        let mut batches = Vec::new();
        let mut current = WriteBatch::new();
        for op in ops {
            if current.ops.len() == MAX_BATCH_WRITES {
                batches.push(std::mem::take(&mut current));
            }
            current.ops.push(op);
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }
}

/// Full content of a collection at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot {
    /// Collection the snapshot was taken from.
    pub collection: Collection,
    /// Every document, in [`sort_documents`] order.
    pub documents: Vec<Document>,
}

/// Current time in the RFC 3339 form the stores use for server timestamps.
pub fn server_now() -> String {
    OffsetDateTime::from(SystemTime::now())
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Order documents the way snapshots expose them: matches by round, everything else by id.
pub fn sort_documents(collection: Collection, documents: &mut [Document]) {
    match collection {
        Collection::Matches => documents.sort_by(|a, b| {
            round_of(a)
                .cmp(&round_of(b))
                .then_with(|| compare_ids(&a.id, &b.id))
        }),
        Collection::Results | Collection::Players => {
            documents.sort_by(|a, b| compare_ids(&a.id, &b.id))
        }
    }
}

fn round_of(document: &Document) -> i64 {
    document
        .fields
        .get("round")
        .and_then(Value::as_i64)
        .unwrap_or(i64::MAX)
}

/// Positional ids compare numerically so "10" follows "9"; other ids compare lexically.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn delete(id: usize) -> WriteOp {
        WriteOp::Delete {
            collection: Collection::Results,
            id: id.to_string(),
        }
    }

    #[test]
    fn batch_refuses_writes_past_the_ceiling() {
        let mut batch = WriteBatch::new();
        for id in 0..MAX_BATCH_WRITES {
            batch.push(delete(id)).unwrap();
        }
        let err = batch.push(delete(MAX_BATCH_WRITES)).unwrap_err();
        assert!(matches!(err, StorageError::BatchFull { limit: 400 }));
    }

    #[test]
    fn chunking_respects_the_ceiling() {
        let batches = WriteBatch::chunked((0..901).map(delete));
        let sizes: Vec<_> = batches.iter().map(WriteBatch::len).collect();
        assert_eq!(sizes, vec![400, 400, 101]);
        assert!(WriteBatch::chunked(Vec::new()).is_empty());
    }

    #[test]
    fn create_refuses_existing_documents() {
        let mut docs = BTreeMap::new();
        let create = || WriteOp::Create {
            collection: Collection::Results,
            id: "1".into(),
            payload: Payload::new(fields(json!({"winnerTeam": "team1"}))),
        };
        create().apply_to(&mut docs, "now").unwrap();
        let err = create().apply_to(&mut docs, "now").unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
    }

    #[test]
    fn merge_keeps_untouched_fields_and_overwrite_drops_them() {
        let mut docs = BTreeMap::new();
        docs.insert("Alice".to_string(), fields(json!({"phone": "1", "note": "x"})));

        WriteOp::Set {
            collection: Collection::Players,
            id: "Alice".into(),
            payload: Payload::new(fields(json!({"phone": "2"}))),
            merge: true,
        }
        .apply_to(&mut docs, "now")
        .unwrap();
        assert_eq!(docs["Alice"], fields(json!({"phone": "2", "note": "x"})));

        WriteOp::Set {
            collection: Collection::Players,
            id: "Alice".into(),
            payload: Payload::new(fields(json!({"phone": "3"}))),
            merge: false,
        }
        .apply_to(&mut docs, "now")
        .unwrap();
        assert_eq!(docs["Alice"], fields(json!({"phone": "3"})));
    }

    #[test]
    fn update_requires_an_existing_document() {
        let mut docs = BTreeMap::new();
        let err = WriteOp::Update {
            collection: Collection::Matches,
            id: "0".into(),
            payload: Payload::new(fields(json!({"team1": "A"}))),
        }
        .apply_to(&mut docs, "now")
        .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn server_timestamps_are_stamped_at_resolve_time() {
        let payload = Payload::new(fields(json!({"phone": "1", "updatedAt": "client"})))
            .with_server_timestamp("updatedAt");
        let resolved = payload.resolve("2026-01-01T00:00:00Z");
        assert_eq!(resolved["updatedAt"], json!("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn matches_sort_by_round_then_positional_id() {
        let doc = |id: &str, round: i64| Document::new(id, fields(json!({ "round": round })));
        let mut docs = vec![doc("10", 1), doc("2", 1), doc("0", 2), doc("1", 1)];
        sort_documents(Collection::Matches, &mut docs);
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "10", "0"]);
    }
}
