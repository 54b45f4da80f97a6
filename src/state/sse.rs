use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Broadcast hub for the scoreboard stream that remembers the latest event, so a client
/// connecting between two changes still renders the current view right away.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
    latest: Mutex<Option<ServerEvent>>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self {
            sender,
            latest: Mutex::new(None),
        }
    }

    /// Register a new subscriber, returning the last event sent so far alongside it.
    pub fn subscribe(&self) -> (Option<ServerEvent>, broadcast::Receiver<ServerEvent>) {
        let latest = self.latest.lock().ok().and_then(|guard| guard.clone());
        (latest, self.sender.subscribe())
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        if let Ok(mut guard) = self.latest.lock() {
            *guard = Some(event.clone());
        }
        let _ = self.sender.send(event);
    }
}
