use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Entry of an uploaded schedule file.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub round: i64,
    pub team1: String,
    pub team2: String,
}

/// Outcome of a schedule upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleUploadResponse {
    /// Matches inserted, with ids `"0"` to `"{matches - 1}"`.
    pub matches: usize,
    pub matches_removed: usize,
    pub results_removed: usize,
    pub message: String,
}
