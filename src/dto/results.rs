use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::dao::models::TeamSide;

/// Scores typed by the user. Numbers and numeric strings are both accepted.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitResultRequest {
    #[schema(value_type = f64)]
    pub team1: Value,
    #[schema(value_type = f64)]
    pub team2: Value,
}

/// Outcome of a successful save.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResultResponse {
    pub match_id: String,
    pub team1: i64,
    pub team2: i64,
    pub winner_team: TeamSide,
    /// `true` when an admin replaced an existing result.
    pub overwritten: bool,
    pub message: String,
}

/// Query flag carried by destructive requests.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfirmQuery {
    /// Set once the user accepted the confirmation prompt.
    #[serde(default)]
    pub confirm: bool,
}

/// Outcome of deleting one or all results.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClearResultsResponse {
    pub deleted: usize,
    pub message: String,
}
