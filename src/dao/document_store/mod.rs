#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::{
    document::{Collection, Document, SnapshotStream, WriteBatch},
    storage::StorageResult,
};

/// Abstraction over the realtime document database backing the scoreboard.
pub trait DocumentStore: Send + Sync {
    /// Fetch one document.
    fn get(&self, collection: Collection, id: &str)
    -> BoxFuture<'static, StorageResult<Option<Document>>>;
    /// Fetch a whole collection, matches ordered by round.
    fn list(&self, collection: Collection) -> BoxFuture<'static, StorageResult<Vec<Document>>>;
    /// Commit a batch of at most [`crate::dao::document::MAX_BATCH_WRITES`] writes.
    fn commit(&self, batch: WriteBatch) -> BoxFuture<'static, StorageResult<()>>;
    /// Current snapshot of the collection followed by a new snapshot after every change.
    fn subscribe(&self, collection: Collection) -> SnapshotStream;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
