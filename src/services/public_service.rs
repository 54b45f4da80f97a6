//! Service helpers that expose read-only projections of the live scoreboard.

use crate::{
    dto::scoreboard::{MatchDetail, MatchOption, MatchRow, ScoreboardView, StandingRow},
    error::ServiceError,
    services::standings,
    state::{SharedState, scoreboard::ScoreboardState},
};

/// Matches table in schedule order.
pub fn match_rows(scoreboard: &ScoreboardState, admin: bool) -> Vec<MatchRow> {
    scoreboard
        .schedule
        .iter()
        .map(|scheduled| {
            let set = scoreboard.results.get(&scheduled.id).map(|result| result.set);
            MatchRow::new(scheduled, set, admin)
        })
        .collect()
}

/// Ranked standings joined with the player directory.
pub fn standing_rows(scoreboard: &ScoreboardState) -> Vec<StandingRow> {
    standings::rank(&scoreboard.standings)
        .iter()
        .map(|ranked| {
            let phone = scoreboard
                .players
                .get(&ranked.player)
                .map(|entry| entry.phone.as_str());
            StandingRow::new(ranked, phone)
        })
        .collect()
}

/// Full view rendered from the caches.
pub fn build_view(scoreboard: &ScoreboardState, admin: bool, degraded: bool) -> ScoreboardView {
    ScoreboardView {
        options: scoreboard
            .schedule
            .iter()
            .map(MatchOption::from_match)
            .collect(),
        matches: match_rows(scoreboard, admin),
        standings: standing_rows(scoreboard),
        degraded,
    }
}

/// Current view as seen by a caller with the given privileges.
pub async fn get_scoreboard(state: &SharedState, admin: bool) -> ScoreboardView {
    let degraded = state.is_degraded().await;
    let guard = state.scoreboard().read().await;
    build_view(&guard, admin, degraded)
}

pub async fn get_matches(state: &SharedState, admin: bool) -> Vec<MatchRow> {
    let guard = state.scoreboard().read().await;
    match_rows(&guard, admin)
}

pub async fn get_standings(state: &SharedState) -> Vec<StandingRow> {
    let guard = state.scoreboard().read().await;
    standing_rows(&guard)
}

/// One match with the result to prefill the score editor.
pub async fn get_match(state: &SharedState, id: &str) -> Result<MatchDetail, ServiceError> {
    let guard = state.scoreboard().read().await;
    let scheduled = guard
        .find_match(id)
        .ok_or_else(|| ServiceError::NotFound(format!("match `{id}`")))?;
    let previous = guard
        .results
        .get(id)
        .map(|result| (result.set, result.submitted_at));
    Ok(MatchDetail::new(scheduled, previous))
}
