//! Result write policy: who may record, correct or remove the outcome of a match.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    dao::{
        document::{Collection, Payload, WriteBatch, WriteOp},
        models::{ResultEntity, SetScore, fields},
        rules::GuardedStore,
        storage::StorageError,
    },
    dto::results::{ClearResultsResponse, SubmitResultRequest, SubmitResultResponse},
    error::ServiceError,
    services::{commit_batches, require_admin},
};

/// Reported to non-admins who lose the race for a match or try to overwrite it.
pub const CONFLICT_MESSAGE: &str =
    "A result is already recorded for this match. Please contact an admin for corrections.";

/// Lifecycle of the result attached to one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultPhase {
    /// The match has not been played yet.
    NoResult,
    /// A result document exists for the match.
    Recorded,
}

/// Writes that move a match between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultEvent {
    /// Create-only write by any caller.
    Create,
    /// Admin create-or-overwrite.
    Overwrite,
    /// Admin removal.
    Delete,
}

/// Error returned when an event cannot be applied in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    pub from: ResultPhase,
    pub event: ResultEvent,
}

/// Compute the phase reached by applying `event` in `from`.
pub fn transition(from: ResultPhase, event: ResultEvent) -> Result<ResultPhase, InvalidTransition> {
    match (from, event) {
        (ResultPhase::NoResult, ResultEvent::Create) => Ok(ResultPhase::Recorded),
        (_, ResultEvent::Overwrite) => Ok(ResultPhase::Recorded),
        (ResultPhase::Recorded, ResultEvent::Delete) => Ok(ResultPhase::NoResult),
        (from, event) => Err(InvalidTransition { from, event }),
    }
}

impl ResultPhase {
    fn of(existing: bool) -> Self {
        if existing {
            ResultPhase::Recorded
        } else {
            ResultPhase::NoResult
        }
    }
}

/// Read one score from user input: a JSON number or a numeric string, finite and whole.
pub fn parse_score(value: &Value) -> Result<i64, ServiceError> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) if !text.trim().is_empty() => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(score) if score.is_finite() && score.fract() == 0.0 && score.abs() < 1e15 => {
            Ok(score as i64)
        }
        _ => Err(ServiceError::InvalidInput("Enter valid numbers".into())),
    }
}

/// Validate both scores and derive the winner. Ties are rejected.
pub fn validate_set(request: &SubmitResultRequest) -> Result<SetScore, ServiceError> {
    let set = SetScore {
        team1: parse_score(&request.team1)?,
        team2: parse_score(&request.team2)?,
    };
    if set.winner().is_none() {
        return Err(ServiceError::InvalidInput("Scores cannot be tied".into()));
    }
    Ok(set)
}

/// Record a result for `match_id`.
///
/// Non-admins issue a create-only write and never overwrite: the store refuses the second writer,
/// which is reported with [`CONFLICT_MESSAGE`]. Admins create or overwrite.
pub async fn submit_result(
    store: &GuardedStore,
    match_id: &str,
    request: &SubmitResultRequest,
) -> Result<SubmitResultResponse, ServiceError> {
    let match_id = match_id.trim();
    if match_id.is_empty() {
        return Err(ServiceError::InvalidInput("Select a match".into()));
    }

    let set = validate_set(request)?;
    let Some(winner_team) = set.winner() else {
        return Err(ServiceError::InvalidInput("Scores cannot be tied".into()));
    };

    if store.get(Collection::Matches, match_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("match `{match_id}`")));
    }

    let entity = ResultEntity {
        set,
        winner_team,
        submitted_by: store.identity().uid.clone(),
        submitted_at: None,
        updated_at: None,
    };
    let payload = Payload::from_entity(&entity)
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?
        .with_server_timestamp(fields::SUBMITTED_AT)
        .with_server_timestamp(fields::UPDATED_AT);

    let admin = store.role().is_admin();
    let (op, event) = if admin {
        (
            WriteOp::Set {
                collection: Collection::Results,
                id: match_id.to_string(),
                payload,
                merge: true,
            },
            ResultEvent::Overwrite,
        )
    } else {
        (
            WriteOp::Create {
                collection: Collection::Results,
                id: match_id.to_string(),
                payload,
            },
            ResultEvent::Create,
        )
    };

    let overwritten = if admin {
        store.get(Collection::Results, match_id).await?.is_some()
    } else {
        false
    };

    if let Err(err) = store.write(op).await {
        return Err(classify_write_error(admin, err));
    }

    info!(
        match_id,
        ?event,
        submitted_by = %entity.submitted_by,
        team1 = set.team1,
        team2 = set.team2,
        "result recorded"
    );

    let message = if admin {
        "Match saved (admin)"
    } else {
        "Match submitted"
    };
    Ok(SubmitResultResponse {
        match_id: match_id.to_string(),
        team1: set.team1,
        team2: set.team2,
        winner_team,
        overwritten,
        message: message.to_string(),
    })
}

fn classify_write_error(admin: bool, err: StorageError) -> ServiceError {
    if !admin && err.is_write_conflict() {
        warn!(error = %err, "result write refused; match already recorded");
        ServiceError::Conflict(CONFLICT_MESSAGE.into())
    } else {
        ServiceError::SaveFailed(err)
    }
}

/// Remove the result of one match. Admin only; the result must exist.
pub async fn delete_result(
    store: &GuardedStore,
    match_id: &str,
    confirm: bool,
) -> Result<ClearResultsResponse, ServiceError> {
    require_admin(store)?;
    let match_id = match_id.trim();
    if match_id.is_empty() {
        return Err(ServiceError::InvalidInput("Select a match".into()));
    }

    let existing = store.get(Collection::Results, match_id).await?;
    transition(ResultPhase::of(existing.is_some()), ResultEvent::Delete)
        .map_err(|_| ServiceError::NotFound("No result to delete".into()))?;

    if !confirm {
        return Err(ServiceError::ConfirmationRequired(
            "Delete this match result?".into(),
        ));
    }

    store
        .write(WriteOp::Delete {
            collection: Collection::Results,
            id: match_id.to_string(),
        })
        .await?;
    info!(match_id, "result deleted");

    Ok(ClearResultsResponse {
        deleted: 1,
        message: "Result deleted".into(),
    })
}

/// Remove every result, in batches. Admin only.
pub async fn delete_all_results(
    store: &GuardedStore,
    confirm: bool,
) -> Result<ClearResultsResponse, ServiceError> {
    require_admin(store)?;
    if !confirm {
        return Err(ServiceError::ConfirmationRequired(
            "Delete ALL results?".into(),
        ));
    }

    let results = store.list(Collection::Results).await?;
    let deleted = results.len();
    let batches = WriteBatch::chunked(results.into_iter().map(|document| WriteOp::Delete {
        collection: Collection::Results,
        id: document.id,
    }));
    commit_batches(store, batches, "delete_all_results").await?;
    info!(deleted, "all results deleted");

    Ok(ClearResultsResponse {
        deleted,
        message: "All results deleted".into(),
    })
}
