//! Error types for the acctremap core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),
}

// ---------------------------------------------------------------------------
// Tracker API errors
// ---------------------------------------------------------------------------

/// Errors from issue-tracker REST API interactions.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("tracker HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("tracker API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Credentials were rejected.
    #[error("tracker authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A credential required to build the client was never resolved.
    #[error("tracker credential '{0}' is not set")]
    MissingCredential(&'static str),

    /// JSON deserialization failure.
    #[error("tracker response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Institutional directory errors
// ---------------------------------------------------------------------------

/// Errors from the institutional identity-resolution API.
///
/// Non-2xx responses are not errors here; they are reported as a missing
/// identity so the caller can skip the row.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// HTTP-level transport error.
    #[error("directory HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API key was never resolved.
    #[error("directory credential '{0}' is not set")]
    MissingCredential(&'static str),

    /// The configured API key cannot be sent as a header value.
    #[error("directory API key is not a valid header value")]
    InvalidApiKey,
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Errors reading the account-ID CSV.
#[derive(Debug, Error)]
pub enum InputError {
    /// Malformed CSV or an I/O failure underneath the reader.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input file could not be opened.
    #[error("cannot open input '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
