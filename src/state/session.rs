use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Who is calling: the identity token plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Identity token recorded as `submittedBy` on results.
    pub uid: String,
    pub email: Option<String>,
    /// Session handed out without credentials.
    pub anonymous: bool,
}

impl Identity {
    pub fn anonymous(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            anonymous: true,
        }
    }

    pub fn signed_in(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
            anonymous: false,
        }
    }
}

/// Privilege level of a caller, resolved once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Session assigned without credentials.
    Anonymous,
    /// Signed in, but not on the admin allow-list.
    Authenticated,
    /// Signed in and allow-listed: unrestricted writes.
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

/// Identity and role bound to a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
    pub role: Role,
}

/// Sessions kept at most by default; the least recently seen one makes room for a new one.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct SessionEntry {
    session: Session,
    last_seen: Instant,
}

/// Live sessions keyed by their opaque token.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_max_sessions(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding at most `max_sessions` sessions.
    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Open a session for `identity` and return it with its fresh token.
    pub fn open(&self, identity: Identity, role: Role) -> Session {
        while self.sessions.len() >= self.max_sessions {
            if !self.evict_least_recent() {
                break;
            }
        }

        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            identity,
            role,
        };
        self.sessions.insert(
            session.token.clone(),
            SessionEntry {
                session: session.clone(),
                last_seen: Instant::now(),
            },
        );
        session
    }

    /// Session bound to `token`; a hit counts as activity.
    pub fn get(&self, token: &str) -> Option<Session> {
        self.sessions.get_mut(token).map(|mut entry| {
            entry.last_seen = Instant::now();
            entry.session.clone()
        })
    }

    /// Drop a session, returning it when it existed.
    pub fn close(&self, token: &str) -> Option<Session> {
        self.sessions.remove(token).map(|(_, entry)| entry.session)
    }

    /// Drop every session unused for at least `idle`; returns how many were dropped.
    pub fn expire_idle(&self, idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.last_seen.elapsed() < idle);
        before.saturating_sub(self.sessions.len())
    }

    fn evict_least_recent(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.last_seen)
            .map(|entry| entry.key().clone());
        match oldest {
            Some(token) => self.sessions.remove(&token).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_open_resolve_and_close() {
        let registry = SessionRegistry::new();
        let session = registry.open(Identity::anonymous("anon-1"), Role::Anonymous);

        assert_eq!(registry.get(&session.token), Some(session.clone()));
        assert_eq!(registry.close(&session.token), Some(session.clone()));
        assert!(registry.get(&session.token).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn tokens_are_unique_per_session() {
        let registry = SessionRegistry::new();
        let a = registry.open(Identity::anonymous("a"), Role::Anonymous);
        let b = registry.open(Identity::anonymous("b"), Role::Anonymous);
        assert_ne!(a.token, b.token);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn idle_sessions_expire_while_active_ones_stay() {
        let registry = SessionRegistry::new();
        let idle = registry.open(Identity::anonymous("idle"), Role::Anonymous);
        let active = registry.open(Identity::anonymous("active"), Role::Anonymous);

        std::thread::sleep(Duration::from_millis(60));
        assert!(registry.get(&active.token).is_some());

        assert_eq!(registry.expire_idle(Duration::from_millis(50)), 1);
        assert!(registry.get(&idle.token).is_none());
        assert!(registry.get(&active.token).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn full_registry_evicts_the_least_recently_seen_session() {
        let registry = SessionRegistry::with_max_sessions(2);
        let first = registry.open(Identity::anonymous("a"), Role::Anonymous);
        std::thread::sleep(Duration::from_millis(5));
        let second = registry.open(Identity::anonymous("b"), Role::Anonymous);
        std::thread::sleep(Duration::from_millis(5));
        let third = registry.open(Identity::anonymous("c"), Role::Anonymous);

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&first.token).is_none());
        assert!(registry.get(&second.token).is_some());
        assert!(registry.get(&third.token).is_some());
    }
}
