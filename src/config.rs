//! Application-level configuration loading: admin allow-lists and sign-in accounts.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::session::{Identity, Role};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCOREBOARD_BACK_CONFIG_PATH";

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    admin_uids: Vec<String>,
    admin_emails: Vec<String>,
    accounts: Vec<Account>,
}

/// Email + password account allowed to sign in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub email: String,
    pub password: String,
    /// Identity token issued to the account once signed in.
    pub uid: String,
}

impl AppConfig {
    /// Build a configuration from explicit lists.
    pub fn new(admin_uids: Vec<String>, admin_emails: Vec<String>, accounts: Vec<Account>) -> Self {
        Self {
            admin_uids,
            admin_emails,
            accounts,
        }
    }

    /// Load the application configuration from disk, falling back to an empty configuration
    /// (no admins, no accounts).
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        admins = app_config.admin_uids.len() + app_config.admin_emails.len(),
                        accounts = app_config.accounts.len(),
                        "loaded scoreboard config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Resolve the role of an identity against the admin allow-lists.
    pub fn role_for(&self, identity: &Identity) -> Role {
        if identity.anonymous {
            return Role::Anonymous;
        }

        let by_uid = self.admin_uids.iter().any(|uid| *uid == identity.uid);
        let by_email = identity
            .email
            .as_ref()
            .is_some_and(|email| self.admin_emails.iter().any(|admin| admin == email));

        if by_uid || by_email {
            Role::Admin
        } else {
            Role::Authenticated
        }
    }

    /// Find the account matching an email + password pair.
    pub fn find_account(&self, email: &str, password: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.email == email && account.password == password)
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    admin_uids: Vec<String>,
    #[serde(default)]
    admin_emails: Vec<String>,
    #[serde(default)]
    accounts: Vec<Account>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self::new(value.admin_uids, value.admin_emails, value.accounts)
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
