pub mod scoreboard;
pub mod session;
mod sse;

use std::sync::Arc;

use tokio::{
    sync::{Mutex, RwLock, watch},
    task::JoinHandle,
};

use crate::{
    config::AppConfig,
    dao::{document_store::DocumentStore, rules::GuardedStore},
    error::ServiceError,
};

pub use self::sse::SseHub;
use self::{
    scoreboard::ScoreboardState,
    session::{Session, SessionRegistry},
};

pub type SharedState = Arc<AppState>;

/// Capacity of the scoreboard SSE broadcast channel.
const SSE_CAPACITY: usize = 16;

/// Central application state: store handle, sessions, live scoreboard caches and SSE hub.
pub struct AppState {
    config: AppConfig,
    store: RwLock<Option<Arc<dyn DocumentStore>>>,
    sessions: SessionRegistry,
    scoreboard: RwLock<ScoreboardState>,
    sse: SseHub,
    live_tasks: Mutex<Vec<JoinHandle<()>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            store: RwLock::new(None),
            sessions: SessionRegistry::new(),
            scoreboard: RwLock::new(ScoreboardState::default()),
            sse: SseHub::new(SSE_CAPACITY),
            live_tasks: Mutex::new(Vec::new()),
            degraded: degraded_tx,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn DocumentStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store or [`ServiceError::Degraded`].
    pub async fn require_store(&self) -> Result<Arc<dyn DocumentStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Store handle bound to the session's identity and role.
    pub async fn guarded_store(&self, session: &Session) -> Result<GuardedStore, ServiceError> {
        let store = self.require_store().await?;
        Ok(GuardedStore::new(
            store,
            session.identity.clone(),
            session.role,
        ))
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn DocumentStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Live caches owned by the view binder.
    pub fn scoreboard(&self) -> &RwLock<ScoreboardState> {
        &self.scoreboard
    }

    /// Broadcast hub used for the scoreboard SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Handles of the running subscription tasks, replaced on every re-subscription.
    pub fn live_tasks(&self) -> &Mutex<Vec<JoinHandle<()>>> {
        &self.live_tasks
    }
}
