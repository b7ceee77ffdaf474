//! CLI error types with miette diagnostics.
//!
//! Wraps library errors and unsuccessful envelopes into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use portico_api::Envelope;
use portico_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the backend: {message}")]
    #[diagnostic(
        code(portico::connection_failed),
        help(
            "Check that the backend is running and the base URL is correct.\n\
             Self-signed certificate? Try: portico --insecure ..."
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Not authenticated (HTTP {status})")]
    #[diagnostic(
        code(portico::unauthorized),
        help(
            "The session is missing or could not be refreshed.\n\
             Log in first: portico request --login ... or pass --username"
        )
    )]
    Unauthorized { status: u16 },

    #[error("Login failed (HTTP {status}): {message}")]
    #[diagnostic(
        code(portico::login_failed),
        help("Verify the username, password and account type (--as staff|employee).")
    )]
    LoginFailed { status: u16, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(portico::no_credentials),
        help(
            "Pass --username, or configure one with: portico config init\n\
             Passwords are read from PORTICO_PASSWORD, the keyring, or a prompt."
        )
    )]
    NoCredentials { profile: String },

    // ── Responses ────────────────────────────────────────────────────

    #[error("Request failed (HTTP {status}): {message}")]
    #[diagnostic(code(portico::request_failed))]
    RequestFailed { status: u16, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(portico::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("No base URL configured")]
    #[diagnostic(
        code(portico::no_config),
        help(
            "Pass --base-url, set PORTICO_BASE_URL, or create a profile with: portico config init\n\
             Config file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(portico::config))]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(portico::client))]
    Client(#[from] portico_api::Error),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(portico::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Unauthorized { .. } | Self::LoginFailed { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::RequestFailed { status: 404, .. } => exit_code::NOT_FOUND,
            Self::RequestFailed { status: 409, .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            Self::Config(ConfigError::NoCredentials { .. }) => exit_code::AUTH,
            Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Classify an unsuccessful envelope.
    pub fn from_envelope(envelope: &Envelope) -> Self {
        let message = envelope
            .error_message()
            .map_or_else(|| envelope.data.to_string(), String::from);
        match envelope.status {
            0 => Self::ConnectionFailed { message },
            401 | 403 => Self::Unauthorized {
                status: envelope.status,
            },
            status => Self::RequestFailed { status, message },
        }
    }
}
