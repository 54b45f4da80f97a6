use serde::Serialize;

/// One frame of the scoreboard stream, fanned out to every SSE subscriber.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// SSE `event:` line; unnamed frames arrive as plain `message` events.
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    pub fn new(event: Option<&str>, data: impl Into<String>) -> Self {
        Self {
            event: event.map(str::to_string),
            data: data.into(),
        }
    }

    /// Named frame whose data is `payload` as JSON.
    pub fn json<T: Serialize>(event: &str, payload: &T) -> serde_json::Result<Self> {
        Ok(Self::new(Some(event), serde_json::to_string(payload)?))
    }
}
