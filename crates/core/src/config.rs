//! TOML-based configuration for acctremap.
//!
//! Every section has defaults, so the tool runs without a config file. All
//! secrets (tracker credentials, directory API key) are stored as `_env`
//! fields that reference environment variable names; the actual values are
//! resolved at runtime via [`AppConfig::resolve_env_vars`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Issue-tracker API settings.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Institutional identity API settings.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Run behaviour.
    #[serde(default)]
    pub run: RunConfig,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Issue-tracker REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// REST API base URL, including the API version path.
    #[serde(default = "default_tracker_url")]
    pub base_url: String,

    /// Environment variable holding the basic-auth username.
    #[serde(default = "default_username_env")]
    pub username_env: String,

    /// Environment variable holding the basic-auth password or API token.
    #[serde(default = "default_password_env")]
    pub password_env: String,

    /// Display name of the participants field, as used in search queries.
    #[serde(default = "default_participants_field_name")]
    pub participants_field_name: String,

    /// Field ID of the participants field, as used in update requests.
    #[serde(default = "default_participants_field_id")]
    pub participants_field_id: String,

    /// Maximum number of issues fetched per account.
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// `accountType` marking a native tracker account.
    #[serde(default = "default_first_party_account_type")]
    pub first_party_account_type: String,

    /// Whether issue watchers are notified of the update.
    #[serde(default)]
    pub notify_users: bool,

    /// Resolved username (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub username: Option<String>,

    /// Resolved password (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub password: Option<String>,
}

fn default_tracker_url() -> String {
    "https://uwaterloo.atlassian.net/rest/api/3".into()
}
fn default_username_env() -> String {
    "JIRA_USERNAME".into()
}
fn default_password_env() -> String {
    "JIRA_PASSWORD".into()
}
fn default_participants_field_name() -> String {
    "request participants".into()
}
fn default_participants_field_id() -> String {
    "customfield_10026".into()
}
fn default_max_results() -> u32 {
    100
}
fn default_first_party_account_type() -> String {
    "atlassian".into()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: default_tracker_url(),
            username_env: default_username_env(),
            password_env: default_password_env(),
            participants_field_name: default_participants_field_name(),
            participants_field_id: default_participants_field_id(),
            max_results: default_max_results(),
            first_party_account_type: default_first_party_account_type(),
            notify_users: false,
            username: None,
            password: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Institutional identity API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Full URL of the email resolution endpoint.
    #[serde(default = "default_directory_url")]
    pub url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Skip TLS certificate verification (the directory serves an
    /// internally-signed certificate).
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,

    /// Resolved API key.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_directory_url() -> String {
    "https://iss-api.uwaterloo.ca/resolve_upn".into()
}
fn default_api_key_env() -> String {
    "ISS_API_KEY".into()
}
fn default_true() -> bool {
    true
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            url: default_directory_url(),
            api_key_env: default_api_key_env(),
            accept_invalid_certs: true,
            api_key: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Run behaviour
// ---------------------------------------------------------------------------

/// Run behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log planned replacements instead of sending update requests.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve all `*_env` fields from environment variables.
    ///
    /// Missing variables only log a warning; callers that talk to the APIs
    /// check [`require_credentials`](Self::require_credentials) afterwards.
    pub fn resolve_env_vars(&mut self) {
        info!("resolving environment variable references in config");

        self.tracker.username =
            resolve_optional_env(&self.tracker.username_env, "tracker.username_env");
        self.tracker.password =
            resolve_optional_env(&self.tracker.password_env, "tracker.password_env");
        self.directory.api_key =
            resolve_optional_env(&self.directory.api_key_env, "directory.api_key_env");

        debug!("environment variable resolution complete");
    }

    /// Validate that all non-secret fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tracker.base_url".into(),
                detail: "tracker URL must not be empty".into(),
            });
        }
        if self.tracker.participants_field_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tracker.participants_field_id".into(),
                detail: "participants field ID must not be empty".into(),
            });
        }
        if self.tracker.participants_field_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tracker.participants_field_name".into(),
                detail: "participants field name must not be empty".into(),
            });
        }
        if !(1..=1000).contains(&self.tracker.max_results) {
            return Err(ConfigError::InvalidValue {
                field: "tracker.max_results".into(),
                detail: "max results must be between 1 and 1000".into(),
            });
        }
        if self.directory.url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "directory.url".into(),
                detail: "directory URL must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Fail if any secret needed to talk to either API is unresolved.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        let required = [
            (
                &self.tracker.username,
                &self.tracker.username_env,
                "tracker.username_env",
            ),
            (
                &self.tracker.password,
                &self.tracker.password_env,
                "tracker.password_env",
            ),
            (
                &self.directory.api_key,
                &self.directory.api_key_env,
                "directory.api_key_env",
            ),
        ];
        for (value, var, field) in required {
            if value.is_none() {
                return Err(ConfigError::EnvVarMissing {
                    var: var.clone(),
                    field: field.into(),
                });
            }
        }
        Ok(())
    }

    /// Convenience: load (or default), resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => {
                debug!("no configuration file given, using defaults");
                Self::default()
            }
        };
        config.resolve_env_vars();
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
