use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::warn;

use crate::{
    dao::{
        document::{CollectionSnapshot, Document},
        models::{MatchEntity, PlayerEntity, ResultEntity},
    },
    services::standings::{self, Standing},
};

/// Match as exposed to views: its document id plus the schedule fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledMatch {
    pub id: String,
    pub round: i64,
    pub team1: String,
    pub team2: String,
}

impl ScheduledMatch {
    pub fn from_entity(id: impl Into<String>, entity: MatchEntity) -> Self {
        Self {
            id: id.into(),
            round: entity.round,
            team1: entity.team1,
            team2: entity.team2,
        }
    }
}

/// Caches fed by the three live subscriptions, plus the standings derived from them.
///
/// Each cache is replaced wholesale by the matching snapshot.
#[derive(Debug, Clone, Default)]
pub struct ScoreboardState {
    pub schedule: Vec<ScheduledMatch>,
    pub results: HashMap<String, ResultEntity>,
    pub players: HashMap<String, PlayerEntity>,
    pub standings: IndexMap<String, Standing>,
}

/// Decode every document, logging and skipping the malformed ones.
fn decode_all<T>(snapshot: &CollectionSnapshot) -> Vec<(String, T)>
where
    T: serde::de::DeserializeOwned,
{
    snapshot
        .documents
        .iter()
        .filter_map(|document: &Document| match document.decode::<T>() {
            Ok(entity) => Some((document.id.clone(), entity)),
            Err(err) => {
                warn!(
                    collection = %snapshot.collection,
                    id = %document.id,
                    error = %err,
                    "skipping malformed document"
                );
                None
            }
        })
        .collect()
}

impl ScoreboardState {
    /// Replace the schedule with an ordered matches snapshot and recompute standings.
    pub fn apply_schedule(&mut self, snapshot: &CollectionSnapshot) {
        self.schedule = decode_all::<MatchEntity>(snapshot)
            .into_iter()
            .map(|(id, entity)| ScheduledMatch::from_entity(id, entity))
            .collect();
        self.recompute();
    }

    /// Replace the results with a results snapshot and recompute standings.
    pub fn apply_results(&mut self, snapshot: &CollectionSnapshot) {
        self.results = decode_all::<ResultEntity>(snapshot).into_iter().collect();
        self.recompute();
    }

    /// Replace the player directory. Standings do not depend on it.
    pub fn apply_players(&mut self, snapshot: &CollectionSnapshot) {
        self.players = decode_all::<PlayerEntity>(snapshot).into_iter().collect();
    }

    pub fn find_match(&self, id: &str) -> Option<&ScheduledMatch> {
        self.schedule.iter().find(|scheduled| scheduled.id == id)
    }

    fn recompute(&mut self) {
        self.standings = standings::compute(&self.schedule, &self.results);
    }
}
