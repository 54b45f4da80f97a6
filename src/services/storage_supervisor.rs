use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

#[cfg(feature = "couch-store")]
use crate::dao::document_store::couchdb::{CouchConfig, CouchDocumentStore};
use crate::{
    dao::{
        document_store::{DocumentStore, memory::MemoryStore},
        storage::StorageError,
    },
    services::live_view,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Store selected from the environment at startup.
#[derive(Clone)]
pub enum StoreBackend {
    /// Process-local store; the same instance is reinstalled on every connection.
    Memory(MemoryStore),
    /// CouchDB database reached over HTTP.
    #[cfg(feature = "couch-store")]
    Couch(CouchConfig),
}

impl StoreBackend {
    /// CouchDB when `COUCH_BASE_URL` is set, the in-memory store otherwise.
    pub fn from_env() -> Result<Self, StorageError> {
        #[cfg(feature = "couch-store")]
        if let Some(config) = CouchConfig::from_env()? {
            info!(base_url = %config.base_url, database = %config.database, "using CouchDB store");
            return Ok(StoreBackend::Couch(config));
        }

        info!("using in-memory store");
        Ok(StoreBackend::Memory(MemoryStore::new()))
    }

    /// Open a connection to the backend.
    pub async fn connect(&self) -> Result<Arc<dyn DocumentStore>, StorageError> {
        match self {
            StoreBackend::Memory(store) => Ok(Arc::new(store.clone())),
            #[cfg(feature = "couch-store")]
            StoreBackend::Couch(config) => {
                let store = CouchDocumentStore::connect(config.clone()).await?;
                Ok(Arc::new(store))
            }
        }
    }
}

/// Install `store`, leave degraded mode and bind the live view to it.
pub async fn install(state: &SharedState, store: Arc<dyn DocumentStore>) {
    state.install_store(store.clone()).await;
    live_view::restart(state, store).await;
}

async fn set_degraded(state: &SharedState, degraded: bool) {
    if state.is_degraded().await != degraded {
        state.update_degraded(degraded).await;
        live_view::broadcast_view(state).await;
    }
}

/// Reconnect to the storage backend and keep the shared state in degraded mode when it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn DocumentStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                install(&state, store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                loop {
                    match store.health_check().await {
                        Ok(()) => {
                            if state.is_degraded().await {
                                info!("storage healthy again; leaving degraded mode");
                                set_degraded(&state, false).await;
                            }
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(err) => {
                            warn!(error = %err, "storage health check failed");
                            let mut attempt = 0;
                            let mut reconnect_delay = INITIAL_DELAY;
                            let mut reconnected = false;

                            while attempt < MAX_RECONNECT_ATTEMPTS {
                                match store.try_reconnect().await {
                                    Ok(()) => {
                                        info!(
                                            "storage reconnection succeeded after health check failure"
                                        );
                                        reconnected = true;
                                        break;
                                    }
                                    Err(reconnect_err) => {
                                        if attempt == 0 {
                                            warn!(
                                                attempt, error = %reconnect_err,
                                                "storage reconnect first attempt failed; entering degraded mode"
                                            );
                                            set_degraded(&state, true).await;
                                        } else {
                                            warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                                        };
                                        attempt += 1;
                                        sleep(reconnect_delay).await;
                                        reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                                    }
                                }
                            }

                            if reconnected {
                                set_degraded(&state, false).await;
                                sleep(HEALTH_POLL_INTERVAL).await;
                                continue;
                            } else {
                                warn!(
                                    "exhausted storage reconnect attempts; reconnecting from scratch"
                                );
                                live_view::stop(&state).await;
                                state.clear_store().await;
                                live_view::broadcast_view(&state).await;
                                break;
                            }
                        }
                    }
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[tokio::test]
    async fn installing_a_store_leaves_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);

        let backend = StoreBackend::Memory(MemoryStore::new());
        install(&state, backend.connect().await.unwrap()).await;

        assert!(!state.is_degraded().await);
        assert!(state.store().await.is_some());
        assert_eq!(state.live_tasks().lock().await.len(), 3);
    }
}
