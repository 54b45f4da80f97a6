use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::models::SetScore,
    dto::format_timestamp,
    services::standings::RankedStanding,
    state::scoreboard::ScheduledMatch,
};

/// Entry of the match picker.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct MatchOption {
    pub id: String,
    /// `Round {round}: {team1} vs {team2}`.
    pub label: String,
}

impl MatchOption {
    pub fn from_match(scheduled: &ScheduledMatch) -> Self {
        Self {
            id: scheduled.id.clone(),
            label: format!(
                "Round {}: {} vs {}",
                scheduled.round, scheduled.team1, scheduled.team2
            ),
        }
    }
}

/// Whether a match has a recorded result.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub enum MatchStatus {
    Completed,
    #[serde(rename = "Not played")]
    NotPlayed,
}

/// Row of the matches table.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct MatchRow {
    pub id: String,
    pub round: i64,
    pub team1: String,
    pub team2: String,
    /// `"{team1}-{team2}"` once a result exists, `"-"` otherwise.
    pub set: String,
    pub status: MatchStatus,
    /// Caller is an admin and a result exists.
    pub can_clear: bool,
}

impl MatchRow {
    pub fn new(scheduled: &ScheduledMatch, set: Option<SetScore>, admin: bool) -> Self {
        let can_clear = admin && set.is_some();
        let (set, status) = match set {
            Some(score) => (
                format!("{}-{}", score.team1, score.team2),
                MatchStatus::Completed,
            ),
            None => ("-".to_string(), MatchStatus::NotPlayed),
        };
        Self {
            id: scheduled.id.clone(),
            round: scheduled.round,
            team1: scheduled.team1.clone(),
            team2: scheduled.team2.clone(),
            set,
            status,
            can_clear,
        }
    }
}

/// Row of the standings table.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct StandingRow {
    pub rank: usize,
    pub player: String,
    /// Digits-only phone from the player directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// `https://wa.me/{phone}` when a phone is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(rename = "Pts")]
    pub pts: u32,
    #[serde(rename = "MP")]
    pub mp: u32,
    #[serde(rename = "W")]
    pub w: u32,
    #[serde(rename = "Raw")]
    pub raw: i64,
    #[serde(rename = "L")]
    pub l: u32,
}

impl StandingRow {
    pub fn new(ranked: &RankedStanding, phone: Option<&str>) -> Self {
        let phone = phone.filter(|phone| !phone.is_empty()).map(str::to_owned);
        Self {
            rank: ranked.rank,
            player: ranked.player.clone(),
            whatsapp: phone.as_ref().map(|digits| format!("https://wa.me/{digits}")),
            phone,
            pts: ranked.standing.pts,
            mp: ranked.standing.mp,
            w: ranked.standing.w,
            raw: ranked.standing.raw,
            l: ranked.standing.l,
        }
    }
}

/// Everything the scoreboard page renders, pushed on every change.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct ScoreboardView {
    pub options: Vec<MatchOption>,
    pub matches: Vec<MatchRow>,
    pub standings: Vec<StandingRow>,
    pub degraded: bool,
}

/// Result already recorded for a match, shown before overwriting it.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct PreviousResult {
    pub team1: i64,
    pub team2: i64,
    /// `"{team1}-{team2}"`.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
}

/// Selected match with its current result, if any.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct MatchDetail {
    pub id: String,
    pub round: i64,
    pub team1: String,
    pub team2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PreviousResult>,
}

impl MatchDetail {
    pub fn new(
        scheduled: &ScheduledMatch,
        previous: Option<(SetScore, Option<time::OffsetDateTime>)>,
    ) -> Self {
        Self {
            id: scheduled.id.clone(),
            round: scheduled.round,
            team1: scheduled.team1.clone(),
            team2: scheduled.team2.clone(),
            previous: previous.map(|(set, submitted_at)| PreviousResult {
                team1: set.team1,
                team2: set.team2,
                text: format!("{}-{}", set.team1, set.team2),
                submitted_at: format_timestamp(submitted_at),
            }),
        }
    }
}
