//! Per-player standings derived from the schedule and the recorded results.

use std::{cmp::Ordering, collections::HashMap};

use indexmap::{IndexMap, IndexSet};

use crate::{
    dao::models::{ResultEntity, TeamSide},
    services::team_codec,
    state::scoreboard::ScheduledMatch,
};

/// Aggregated statistics of one player. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Standing {
    /// One point per win.
    pub pts: u32,
    /// Matches played: the player's matches that have a result.
    pub mp: u32,
    /// Matches won.
    pub w: u32,
    /// Matches lost.
    pub l: u32,
    /// Sum of the player's team score over every played match.
    pub raw: i64,
}

/// Standing with its player name and positional rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedStanding {
    /// 1-based position; equal statistics still get distinct ranks.
    pub rank: usize,
    /// Player name as written in the schedule.
    pub player: String,
    pub standing: Standing,
}

/// Players of one team, each listed once.
fn roster(team: &str) -> IndexSet<String> {
    team_codec::split(team).into_iter().collect()
}

/// Build standings for every player named in the schedule, including players without results.
///
/// Results whose match is no longer scheduled are skipped.
pub fn compute(
    schedule: &[ScheduledMatch],
    results: &HashMap<String, ResultEntity>,
) -> IndexMap<String, Standing> {
    let mut standings: IndexMap<String, Standing> = IndexMap::new();
    for scheduled in schedule {
        for player in roster(&scheduled.team1)
            .into_iter()
            .chain(roster(&scheduled.team2))
        {
            standings.entry(player).or_default();
        }
    }

    let by_id: HashMap<&str, &ScheduledMatch> = schedule
        .iter()
        .map(|scheduled| (scheduled.id.as_str(), scheduled))
        .collect();

    for (match_id, result) in results {
        let Some(scheduled) = by_id.get(match_id.as_str()) else {
            continue;
        };

        let team1 = roster(&scheduled.team1);
        let team2 = roster(&scheduled.team2);
        let team_of = |side: TeamSide| match side {
            TeamSide::Team1 => &team1,
            TeamSide::Team2 => &team2,
        };

        let played: IndexSet<&String> = team1.iter().chain(team2.iter()).collect();
        for player in played {
            standings.entry(player.clone()).or_default().mp += 1;
        }

        let winner = result.winner_team;
        for player in team_of(winner) {
            let entry = standings.entry(player.clone()).or_default();
            entry.w += 1;
            entry.pts += 1;
        }
        for player in team_of(winner.opponent()) {
            standings.entry(player.clone()).or_default().l += 1;
        }

        for side in [TeamSide::Team1, TeamSide::Team2] {
            let score = result.set.of(side);
            for player in team_of(side) {
                standings.entry(player.clone()).or_default().raw += score;
            }
        }
    }

    standings
}

/// Total order used for display: points, then wins (both descending), then name ascending.
fn display_order(a: &(&String, &Standing), b: &(&String, &Standing)) -> Ordering {
    b.1.pts
        .cmp(&a.1.pts)
        .then_with(|| b.1.w.cmp(&a.1.w))
        .then_with(|| a.0.cmp(b.0))
}

/// Sort standings for display and assign positional ranks.
pub fn rank(standings: &IndexMap<String, Standing>) -> Vec<RankedStanding> {
    let mut rows: Vec<(&String, &Standing)> = standings.iter().collect();
    rows.sort_by(display_order);
    rows.into_iter()
        .enumerate()
        .map(|(index, (player, standing))| RankedStanding {
            rank: index + 1,
            player: player.clone(),
            standing: *standing,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::SetScore;

    fn scheduled(id: &str, round: i64, team1: &str, team2: &str) -> ScheduledMatch {
        ScheduledMatch {
            id: id.into(),
            round,
            team1: team1.into(),
            team2: team2.into(),
        }
    }

    fn result(team1: i64, team2: i64) -> ResultEntity {
        ResultEntity {
            set: SetScore { team1, team2 },
            winner_team: if team1 > team2 {
                TeamSide::Team1
            } else {
                TeamSide::Team2
            },
            submitted_by: "anon".into(),
            submitted_at: None,
            updated_at: None,
        }
    }

    fn schedule() -> Vec<ScheduledMatch> {
        vec![
            scheduled("0", 1, "Alice & Bob", "Carol & Dan"),
            scheduled("1", 1, "Eve & Frank", "Gina & Hal"),
            scheduled("2", 2, "Alice & Carol", "Bob & Dan"),
        ]
    }

    #[test]
    fn unplayed_players_still_have_a_standing() {
        let standings = compute(&schedule(), &HashMap::new());
        assert_eq!(standings.len(), 8);
        assert!(standings.values().all(|s| *s == Standing::default()));
    }

    #[test]
    fn winners_get_points_and_every_player_gets_team_score() {
        let mut results = HashMap::new();
        results.insert("0".to_string(), result(6, 4));
        let standings = compute(&schedule(), &results);

        let alice = standings["Alice"];
        assert_eq!(
            alice,
            Standing {
                pts: 1,
                mp: 1,
                w: 1,
                l: 0,
                raw: 6
            }
        );
        let dan = standings["Dan"];
        assert_eq!(
            dan,
            Standing {
                pts: 0,
                mp: 1,
                w: 0,
                l: 1,
                raw: 4
            }
        );
        assert_eq!(standings["Eve"].mp, 0);
    }

    #[test]
    fn win_and_loss_totals_match_team_sizes() {
        let schedule = vec![scheduled("0", 1, "A & B & C", "D & E")];
        let mut results = HashMap::new();
        results.insert("0".to_string(), result(2, 7));
        let standings = compute(&schedule, &results);

        let wins: u32 = standings.values().map(|s| s.w).sum();
        let losses: u32 = standings.values().map(|s| s.l).sum();
        assert_eq!(wins, 2);
        assert_eq!(losses, 3);
        assert!(standings.values().all(|s| s.pts == s.w));
    }

    #[test]
    fn results_for_unscheduled_matches_are_ignored() {
        let mut results = HashMap::new();
        results.insert("99".to_string(), result(6, 1));
        let standings = compute(&schedule(), &results);
        assert!(standings.values().all(|s| s.mp == 0));
    }

    #[test]
    fn matches_played_never_exceeds_scheduled_matches() {
        let schedule = vec![
            scheduled("0", 1, "Bob & Bob", "Carol"),
            scheduled("1", 1, "Bob", "Carol"),
        ];
        let mut results = HashMap::new();
        results.insert("0".to_string(), result(6, 1));
        results.insert("1".to_string(), result(0, 6));
        let standings = compute(&schedule, &results);
        assert_eq!(standings["Bob"].mp, 2);
        assert_eq!(standings["Bob"].w, 1);
        assert_eq!(standings["Carol"].mp, 2);
    }

    #[test]
    fn removing_a_result_removes_its_contribution() {
        let mut results = HashMap::new();
        results.insert("0".to_string(), result(6, 4));
        results.insert("2".to_string(), result(3, 6));
        let before = compute(&schedule(), &results);
        assert_eq!(before["Alice"].mp, 2);
        assert_eq!(before["Alice"].raw, 9);

        results.remove("2");
        let after = compute(&schedule(), &results);
        assert_eq!(
            after["Alice"],
            Standing {
                pts: 1,
                mp: 1,
                w: 1,
                l: 0,
                raw: 6
            }
        );
    }

    #[test]
    fn ranking_orders_by_points_wins_then_name() {
        let mut standings = IndexMap::new();
        standings.insert(
            "bob".to_string(),
            Standing {
                pts: 2,
                w: 2,
                ..Standing::default()
            },
        );
        standings.insert(
            "Zed".to_string(),
            Standing {
                pts: 2,
                w: 2,
                ..Standing::default()
            },
        );
        standings.insert(
            "Amy".to_string(),
            Standing {
                pts: 3,
                w: 3,
                ..Standing::default()
            },
        );
        standings.insert("Cal".to_string(), Standing::default());

        let ranked = rank(&standings);
        let order: Vec<_> = ranked
            .iter()
            .map(|row| (row.rank, row.player.as_str()))
            .collect();
        // Uppercase sorts before lowercase; equal stats still get consecutive ranks.
        assert_eq!(order, vec![(1, "Amy"), (2, "Zed"), (3, "bob"), (4, "Cal")]);
    }
}
