use std::error::Error;
use thiserror::Error;

use crate::dao::document::Collection;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A create-only write targeted a document id that is already taken.
    #[error("document `{collection}/{id}` already exists")]
    AlreadyExists { collection: Collection, id: String },
    /// The authorization rules rejected the write for the caller's role.
    #[error("PERMISSION_DENIED: Missing or insufficient permissions for `{collection}/{id}`")]
    PermissionDenied { collection: Collection, id: String },
    /// An update targeted a document that does not exist.
    #[error("no document to update: `{collection}/{id}`")]
    NotFound { collection: Collection, id: String },
    /// A write batch already holds the maximum number of writes.
    #[error("write batch is full ({limit} writes)")]
    BatchFull { limit: usize },
    /// Backend failure, displayed with the backend's own message.
    #[error("{message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Whether the failure means another writer owns the document or the caller may not touch it.
    ///
    /// Typed backends report [`StorageError::AlreadyExists`] or [`StorageError::PermissionDenied`];
    /// anything else is matched on the backend's own error text.
    pub fn is_write_conflict(&self) -> bool {
        match self {
            StorageError::AlreadyExists { .. } | StorageError::PermissionDenied { .. } => true,
            StorageError::Unavailable { message, source } => {
                conflict_signature(message) || conflict_signature(&source.to_string())
            }
            StorageError::NotFound { .. } | StorageError::BatchFull { .. } => false,
        }
    }
}

fn conflict_signature(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    lowered.contains("already exists")
        || lowered.contains("permission_denied")
        || lowered.contains("missing or insufficient permissions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("{0}")]
    struct BackendText(String);

    #[test]
    fn typed_conflicts_are_detected() {
        let exists = StorageError::AlreadyExists {
            collection: Collection::Results,
            id: "3".into(),
        };
        let denied = StorageError::PermissionDenied {
            collection: Collection::Results,
            id: "3".into(),
        };
        assert!(exists.is_write_conflict());
        assert!(denied.is_write_conflict());
        assert!(!StorageError::BatchFull { limit: 400 }.is_write_conflict());
    }

    #[test]
    fn backend_text_signatures_are_detected() {
        let err = StorageError::unavailable(
            "write rejected".into(),
            BackendText("Missing or insufficient permissions.".into()),
        );
        assert!(err.is_write_conflict());

        let err = StorageError::unavailable("Document Already Exists".into(), BackendText("".into()));
        assert!(err.is_write_conflict());

        let err = StorageError::unavailable("network down".into(), BackendText("timeout".into()));
        assert!(!err.is_write_conflict());
    }
}
