/// Store-agnostic documents, writes and batches.
pub mod document;
/// Document store trait and its backends.
pub mod document_store;
/// Persisted scoreboard entities.
pub mod models;
/// Role-based write rules.
pub mod rules;
/// Storage error type shared by every backend.
pub mod storage;
