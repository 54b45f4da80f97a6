use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::validate_player_name;

/// Rename request. Match ids listed in `allow_duplicates` may end up with the same player twice.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenamePlayerRequest {
    /// Name currently used in the schedule.
    pub original: String,
    /// Replacement name; trimmed, non-blank, without `&`.
    pub new_name: String,
    /// Accept the rename prompt.
    #[serde(default)]
    pub confirm: bool,
    /// Match ids where a duplicate player in one team is accepted.
    #[serde(default)]
    pub allow_duplicates: Vec<String>,
}

impl Validate for RenamePlayerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_names(&self.original, &self.new_name)
    }
}

/// Names to preview a rename for, without writing anything.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenamePreviewRequest {
    /// Name currently used in the schedule.
    pub original: String,
    /// Replacement name.
    pub new_name: String,
}

impl Validate for RenamePreviewRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_names(&self.original, &self.new_name)
    }
}

fn validate_names(original: &str, new_name: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if original.trim().is_empty() {
        let mut err = validator::ValidationError::new("original_blank");
        err.message = Some("Original name must not be blank".into());
        errors.add("original", err);
    }
    if let Err(e) = validate_player_name(new_name) {
        errors.add("new_name", e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Match the rename would touch.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct RenameCandidateDto {
    /// Id of the match document.
    pub match_id: String,
    pub round: i64,
    /// Teams before the rename.
    pub team1: String,
    pub team2: String,
    /// Teams after the rename.
    pub new_team1: String,
    pub new_team2: String,
    /// The rename would list the same player twice in one team.
    pub duplicate_risk: bool,
    /// Question to ask before listing this match in `allow_duplicates`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_prompt: Option<String>,
}

/// Affected matches and the prompt the caller must accept to proceed.
#[derive(Debug, Serialize, ToSchema)]
pub struct RenamePreviewResponse {
    /// Matches naming the original player, in schedule order.
    pub matches: Vec<RenameCandidateDto>,
    /// Confirmation question; absent when nothing would change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Outcome of a rename.
#[derive(Debug, Serialize, ToSchema)]
pub struct RenamePlayerResponse {
    pub renamed: usize,
    /// Duplicate-risk matches left untouched because they were not allowed.
    pub skipped: Vec<String>,
    /// Whether the player's phone moved to the new name.
    pub phone_migrated: bool,
    pub message: String,
    /// Best-effort steps that failed without undoing the rename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Phone as typed by an admin; empty clears it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PhoneRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub confirm: bool,
}

/// Stored phone after the update.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhoneResponse {
    pub player: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_request_requires_usable_names() {
        let ok = RenamePlayerRequest {
            original: "Alice".into(),
            new_name: "Bob".into(),
            confirm: false,
            allow_duplicates: Vec::new(),
        };
        assert!(ok.validate().is_ok());

        let bad = RenamePreviewRequest {
            original: " ".into(),
            new_name: "Bob & Carol".into(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("original"));
        assert!(fields.contains_key("new_name"));
    }
}
