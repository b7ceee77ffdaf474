//! Clap derive structures for the `portico` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use portico_api::SessionKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// portico -- session-aware client for staff and employee portal backends
#[derive(Debug, Parser)]
#[command(
    name = "portico",
    version,
    about = "Call portal backends with cookie sessions, CSRF, and transparent refresh",
    long_about = "Issue requests against staff / employee portal backends.\n\n\
        Every call returns an {ok, status, data} envelope. Expired sessions are\n\
        refreshed once and the request retried before a 401 is reported.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "PORTICO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides profile)
    #[arg(long, short = 'b', env = "PORTICO_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Account type to authenticate as
    #[arg(long = "as", value_name = "KIND", env = "PORTICO_SESSION", global = true)]
    pub session: Option<SessionArg>,

    /// Username for login (overrides profile)
    #[arg(long, short = 'u', env = "PORTICO_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PORTICO_OUTPUT",
        default_value = "json",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PORTICO_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "PORTICO_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Share one session refresh between concurrent requests
    #[arg(long, global = true)]
    pub coalesce_refresh: bool,
}

// ── Shared Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SessionArg {
    Staff,
    Employee,
}

impl From<SessionArg> for SessionKind {
    fn from(arg: SessionArg) -> Self {
        match arg {
            SessionArg::Staff => SessionKind::Staff,
            SessionArg::Employee => SessionKind::Employee,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Key / value table of the response data
    Table,
    /// Status line only (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a request and print the response envelope
    #[command(alias = "req", alias = "r")]
    Request(RequestArgs),

    /// Log in (and complete a one-time-password challenge)
    Login(LoginArgs),

    /// Restore an existing session from cookies and report its type
    Session,

    /// Log out of the current session
    Logout,

    /// Show or update the account profile
    Profile(ProfileArgs),

    /// Forgot / reset / change password
    Password(PasswordArgs),

    /// Manage two-factor authentication
    #[command(name = "2fa")]
    TwoFactor(TwoFactorArgs),

    /// List the endpoint table of an account type
    #[command(alias = "ep")]
    Endpoints(EndpointsArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Request ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS)
    pub method: String,

    /// Path relative to the base URL, or an absolute URL
    pub path: String,

    /// JSON body
    #[arg(long, short = 'd', conflicts_with_all = ["data_file", "form", "file"])]
    pub data: Option<String>,

    /// Read the JSON body from a file
    #[arg(long, conflicts_with_all = ["form", "file"])]
    pub data_file: Option<PathBuf>,

    /// Multipart text field (name=value), repeatable
    #[arg(long, short = 'F', value_name = "NAME=VALUE")]
    pub form: Vec<String>,

    /// Multipart file field (name=path), repeatable
    #[arg(long, value_name = "NAME=PATH")]
    pub file: Vec<String>,

    /// Extra header ("Name: value"), repeatable; overrides defaults
    #[arg(long, short = 'H', value_name = "HEADER")]
    pub header: Vec<String>,

    /// Send without credentials (no cookies)
    #[arg(long)]
    pub no_auth: bool,

    /// Log in with the configured credentials before sending
    #[arg(long, short = 'l')]
    pub login: bool,
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// One-time password, if the account has 2FA enabled
    #[arg(long)]
    pub otp: Option<String>,
}

// ── Profile ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Fetch the account profile
    Show,

    /// Update profile fields from a JSON object
    Update {
        /// JSON object with the fields to change
        #[arg(long, short = 'd')]
        data: String,
    },
}

// ── Password ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PasswordArgs {
    #[command(subcommand)]
    pub command: PasswordCommand,
}

#[derive(Debug, Subcommand)]
pub enum PasswordCommand {
    /// Request a password reset email
    Forgot {
        #[arg(long)]
        email: String,
    },

    /// Complete a reset with the emailed token
    Reset {
        #[arg(long)]
        token: String,
    },

    /// Change the password of the logged-in account
    Change,
}

// ── Two-factor ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TwoFactorArgs {
    #[command(subcommand)]
    pub command: TwoFactorCommand,
}

#[derive(Debug, Subcommand)]
pub enum TwoFactorCommand {
    Enable,
    Disable,
    /// Ask the backend to send a fresh one-time password
    RequestOtp,
}

// ── Endpoints ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EndpointsArgs {
    /// Show both account types
    #[arg(long)]
    pub all: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the effective configuration (secrets masked)
    Show,

    /// Interactively create or update a profile
    Init,

    /// Store the profile password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
