use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Backend failure, surfaced with the backend's own message.
    #[error("{0}")]
    Storage(#[source] StorageError),
    /// A write was refused for a reason other than a conflict.
    #[error("Save failed: {0}")]
    SaveFailed(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Caller lacks a session or the privileges for the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client, rejected before any write.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Another writer already owns the target document.
    #[error("{0}")]
    Conflict(String),
    /// Destructive operation needs the caller to accept the given prompt.
    #[error("confirmation required: {0}")]
    ConfirmationRequired(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A chunked operation failed after some chunks were committed; nothing was rolled back.
    #[error("failed after committing {committed} of {total} batches: {source}")]
    PartialBatch {
        committed: usize,
        total: usize,
        #[source]
        source: StorageError,
    },
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PermissionDenied { .. } => ServiceError::Unauthorized(err.to_string()),
            StorageError::AlreadyExists { .. } => ServiceError::Conflict(err.to_string()),
            StorageError::NotFound { .. } => ServiceError::NotFound(err.to_string()),
            StorageError::BatchFull { .. } | StorageError::Unavailable { .. } => {
                ServiceError::Storage(err)
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The request must be repeated with `confirm` set.
    #[error("confirmation required: {0}")]
    PreconditionRequired(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text shown to the caller, without the variant prefix used in logs.
    pub fn message(&self) -> &str {
        match self {
            AppError::BadRequest(message)
            | AppError::Unauthorized(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message)
            | AppError::PreconditionRequired(message)
            | AppError::ServiceUnavailable(message)
            | AppError::Internal(message) => message,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Storage(source) => AppError::ServiceUnavailable(source.to_string()),
            failed @ ServiceError::SaveFailed(_) => AppError::ServiceUnavailable(failed.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::ConfirmationRequired(prompt) => AppError::PreconditionRequired(prompt),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            partial @ ServiceError::PartialBatch { .. } => AppError::Internal(partial.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PreconditionRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.message().to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::document::Collection;

    #[test]
    fn storage_errors_map_to_service_taxonomy() {
        let denied: ServiceError = StorageError::PermissionDenied {
            collection: Collection::Matches,
            id: "0".into(),
        }
        .into();
        assert!(matches!(denied, ServiceError::Unauthorized(_)));

        let full: ServiceError = StorageError::BatchFull { limit: 400 }.into();
        assert!(matches!(full, ServiceError::Storage(_)));
    }

    #[test]
    fn confirmation_maps_to_precondition_required() {
        let response = AppError::from(ServiceError::ConfirmationRequired(
            "Delete this match result?".into(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::PRECONDITION_REQUIRED);
    }

    #[tokio::test]
    async fn response_body_carries_the_bare_message() {
        let response = AppError::from(ServiceError::Conflict(
            "A result is already recorded for this match.".into(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "A result is already recorded for this match.");
    }

    #[tokio::test]
    async fn save_failures_keep_the_backend_message() {
        let source = StorageError::unavailable(
            "network error".into(),
            std::io::Error::other("connection reset"),
        );
        let response = AppError::from(ServiceError::SaveFailed(source)).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Save failed: network error");
    }
}
