use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// Scheduled contest between two teams within a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Round number the match belongs to.
    pub round: i64,
    /// First team, player names joined by `" & "`.
    pub team1: String,
    /// Second team, player names joined by `" & "`.
    pub team2: String,
}

/// Side of a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Team1,
    Team2,
}

impl TeamSide {
    /// Side that did not win.
    pub fn opponent(self) -> Self {
        match self {
            TeamSide::Team1 => TeamSide::Team2,
            TeamSide::Team2 => TeamSide::Team1,
        }
    }
}

/// Set score recorded for both teams.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SetScore {
    pub team1: i64,
    pub team2: i64,
}

impl SetScore {
    /// Winning side, `None` for a tie.
    pub fn winner(&self) -> Option<TeamSide> {
        match self.team1.cmp(&self.team2) {
            std::cmp::Ordering::Greater => Some(TeamSide::Team1),
            std::cmp::Ordering::Less => Some(TeamSide::Team2),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Score of one side.
    pub fn of(&self, side: TeamSide) -> i64 {
        match side {
            TeamSide::Team1 => self.team1,
            TeamSide::Team2 => self.team2,
        }
    }
}

/// Recorded outcome of a match, stored under the match id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntity {
    pub set: SetScore,
    /// Always agrees with the set comparison.
    pub winner_team: TeamSide,
    /// Identity token of the writer.
    pub submitted_by: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub submitted_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Player directory entry, stored under the player's display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntity {
    /// Digits-only contact phone.
    #[serde(default)]
    pub phone: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Field names shared by the services and the authorization rules.
pub mod fields {
    pub const SUBMITTED_BY: &str = "submittedBy";
    pub const SUBMITTED_AT: &str = "submittedAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const TEAM1: &str = "team1";
    pub const TEAM2: &str = "team2";
    pub const PHONE: &str = "phone";
}
