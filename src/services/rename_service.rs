//! Rename a player in every scheduled match, then move their directory entry.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{info, warn};

use crate::{
    dao::{
        document::{Collection, Fields, Payload, WriteBatch, WriteOp},
        models::{MatchEntity, fields},
        rules::GuardedStore,
    },
    dto::players::{
        RenameCandidateDto, RenamePlayerRequest, RenamePlayerResponse, RenamePreviewRequest,
        RenamePreviewResponse,
    },
    error::ServiceError,
    services::{commit_batches, require_admin, team_codec},
    state::scoreboard::ScheduledMatch,
};

/// A match the rename would rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameCandidate {
    pub scheduled: ScheduledMatch,
    pub new_team1: String,
    pub new_team2: String,
    /// The new name already plays in one of the rewritten teams.
    pub duplicate_risk: bool,
}

/// Trim both names and check they can be used for a rename.
pub fn normalize_names(original: &str, new_name: &str) -> Result<(String, String), ServiceError> {
    let original = original.trim();
    let new_name = new_name.trim();
    if original.is_empty() || new_name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "Both the original and the new name are required".into(),
        ));
    }
    if new_name.contains(team_codec::DELIMITER) {
        return Err(ServiceError::InvalidInput(format!(
            "New name must not contain '{}'",
            team_codec::DELIMITER
        )));
    }
    if original == new_name {
        return Err(ServiceError::InvalidInput(
            "New name must differ from the original".into(),
        ));
    }
    Ok((original.to_string(), new_name.to_string()))
}

/// Every match naming `original`, with its rewritten teams.
pub fn plan(schedule: &[ScheduledMatch], original: &str, new_name: &str) -> Vec<RenameCandidate> {
    schedule
        .iter()
        .filter_map(|scheduled| {
            let in_team1 = team_codec::contains(&scheduled.team1, original);
            let in_team2 = team_codec::contains(&scheduled.team2, original);
            if !in_team1 && !in_team2 {
                return None;
            }

            let rewrite = |team: &str, present: bool| {
                if present {
                    team_codec::replace_in_team(team, original, new_name)
                } else {
                    team.to_string()
                }
            };
            let new_team1 = rewrite(&scheduled.team1, in_team1);
            let new_team2 = rewrite(&scheduled.team2, in_team2);
            let duplicate_risk =
                team_codec::has_duplicates(&new_team1) || team_codec::has_duplicates(&new_team2);

            Some(RenameCandidate {
                scheduled: scheduled.clone(),
                new_team1,
                new_team2,
                duplicate_risk,
            })
        })
        .collect()
}

/// Prompt shown before renaming `count` matches.
pub fn confirmation_prompt(count: usize, original: &str, new_name: &str) -> String {
    format!("Update {count} match(es) to rename \"{original}\" -> \"{new_name}\"?")
}

/// Prompt shown before renaming one match that would end up with a duplicate player.
pub fn duplicate_prompt(match_id: &str) -> String {
    format!(
        "Warning: renaming may create duplicate players in a team for match {match_id}.\nProceed anyway?"
    )
}

async fn load_schedule(store: &GuardedStore) -> Result<Vec<ScheduledMatch>, ServiceError> {
    let documents = store.list(Collection::Matches).await?;
    Ok(documents
        .into_iter()
        .filter_map(|document| match document.decode::<MatchEntity>() {
            Ok(entity) => Some(ScheduledMatch::from_entity(document.id, entity)),
            Err(err) => {
                warn!(id = %document.id, error = %err, "skipping malformed match");
                None
            }
        })
        .collect())
}

fn to_dto(candidate: &RenameCandidate) -> RenameCandidateDto {
    RenameCandidateDto {
        match_id: candidate.scheduled.id.clone(),
        round: candidate.scheduled.round,
        team1: candidate.scheduled.team1.clone(),
        team2: candidate.scheduled.team2.clone(),
        new_team1: candidate.new_team1.clone(),
        new_team2: candidate.new_team2.clone(),
        duplicate_risk: candidate.duplicate_risk,
        duplicate_prompt: candidate
            .duplicate_risk
            .then(|| duplicate_prompt(&candidate.scheduled.id)),
    }
}

/// List the matches a rename would touch without writing anything.
pub async fn preview(
    store: &GuardedStore,
    request: &RenamePreviewRequest,
) -> Result<RenamePreviewResponse, ServiceError> {
    require_admin(store)?;
    let (original, new_name) = normalize_names(&request.original, &request.new_name)?;
    let schedule = load_schedule(store).await?;
    let candidates = plan(&schedule, &original, &new_name);

    let prompt = (!candidates.is_empty())
        .then(|| confirmation_prompt(candidates.len(), &original, &new_name));
    Ok(RenamePreviewResponse {
        matches: candidates.iter().map(to_dto).collect(),
        prompt,
    })
}

/// Rename a player across the schedule.
///
/// Matches at risk of listing the new name twice in one team are only rewritten when their id is
/// in `allow_duplicates`; the others are skipped. The remaining matches need one global
/// confirmation and are updated in batches.
pub async fn rename_player(
    store: &GuardedStore,
    request: &RenamePlayerRequest,
) -> Result<RenamePlayerResponse, ServiceError> {
    require_admin(store)?;
    let (original, new_name) = normalize_names(&request.original, &request.new_name)?;
    let schedule = load_schedule(store).await?;
    let candidates = plan(&schedule, &original, &new_name);

    let allowed: HashSet<&str> = request.allow_duplicates.iter().map(String::as_str).collect();
    let (accepted, declined): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|candidate| {
            !candidate.duplicate_risk || allowed.contains(candidate.scheduled.id.as_str())
        });
    let skipped: Vec<String> = declined
        .into_iter()
        .map(|candidate| candidate.scheduled.id)
        .collect();

    if accepted.is_empty() {
        let message = if skipped.is_empty() {
            format!("No matches found with player \"{original}\".")
        } else {
            format!(
                "No matches renamed; {} match(es) would list a player twice.",
                skipped.len()
            )
        };
        return Ok(RenamePlayerResponse {
            renamed: 0,
            skipped,
            phone_migrated: false,
            message,
            warning: None,
        });
    }

    if !request.confirm {
        return Err(ServiceError::ConfirmationRequired(confirmation_prompt(
            accepted.len(),
            &original,
            &new_name,
        )));
    }

    let renamed = accepted.len();
    let batches = WriteBatch::chunked(accepted.into_iter().map(|candidate| {
        let mut teams = Fields::new();
        teams.insert(fields::TEAM1.into(), Value::String(candidate.new_team1));
        teams.insert(fields::TEAM2.into(), Value::String(candidate.new_team2));
        WriteOp::Update {
            collection: Collection::Matches,
            id: candidate.scheduled.id,
            payload: Payload::new(teams),
        }
    }));
    commit_batches(store, batches, "rename_player").await?;
    info!(%original, %new_name, renamed, skipped = skipped.len(), "player renamed");

    let (phone_migrated, warning) = match migrate_directory_entry(store, &original, &new_name).await
    {
        Ok(migrated) => (migrated, None),
        Err(err) => {
            warn!(%original, %new_name, error = %err, "phone mapping move failed");
            (false, Some(format!("Phone mapping move failed: {err}")))
        }
    };

    Ok(RenamePlayerResponse {
        renamed,
        skipped,
        phone_migrated,
        message: format!("Renamed \"{original}\" to \"{new_name}\" in {renamed} match(es)."),
        warning,
    })
}

/// Copy the directory entry of `original` onto `new_name` (merged), then remove the original.
async fn migrate_directory_entry(
    store: &GuardedStore,
    original: &str,
    new_name: &str,
) -> Result<bool, ServiceError> {
    let Some(entry) = store.get(Collection::Players, original).await? else {
        return Ok(false);
    };

    store
        .write(WriteOp::Set {
            collection: Collection::Players,
            id: new_name.to_string(),
            payload: Payload::new(entry.fields),
            merge: true,
        })
        .await?;
    store
        .write(WriteOp::Delete {
            collection: Collection::Players,
            id: original.to_string(),
        })
        .await?;
    Ok(true)
}
