use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod auth;
pub mod health;
pub mod players;
pub mod results;
pub mod schedule;
pub mod scoreboard;
pub mod sse;
pub mod validation;

fn format_timestamp(time: Option<OffsetDateTime>) -> Option<String> {
    time.map(|time| {
        time.format(&Rfc3339)
            .unwrap_or_else(|_| "invalid-timestamp".into())
    })
}
