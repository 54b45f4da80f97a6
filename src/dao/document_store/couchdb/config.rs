use std::time::Duration;

use super::error::{CouchDaoError, CouchResult};

/// How long CouchDB may hold a `_changes` long-poll open before answering empty.
const DEFAULT_CHANGES_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration describing how to connect to CouchDB.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub changes_timeout: Duration,
}

impl CouchConfig {
    /// Construct a configuration from explicit base URL and database name.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
            changes_timeout: DEFAULT_CHANGES_TIMEOUT,
        }
    }

    /// Attach basic-auth credentials to the configuration.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Build a configuration from `COUCH_BASE_URL`, `COUCH_DB` and optional credentials.
    ///
    /// Returns `Ok(None)` when `COUCH_BASE_URL` is unset so callers can fall back to the
    /// in-memory store.
    pub fn from_env() -> CouchResult<Option<Self>> {
        let Ok(base_url) = std::env::var("COUCH_BASE_URL") else {
            return Ok(None);
        };
        let database = std::env::var("COUCH_DB")
            .map_err(|_| CouchDaoError::MissingEnvVar { var: "COUCH_DB" })?;

        let mut config = Self::new(base_url, database);

        if let (Some(username), Some(password)) = (
            std::env::var("COUCH_USERNAME").ok(),
            std::env::var("COUCH_PASSWORD").ok(),
        ) {
            config = config.with_credentials(username, password);
        }

        Ok(Some(config))
    }
}
