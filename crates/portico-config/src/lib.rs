//! Shared configuration for portico tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation into `portico_api` client and transport settings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use portico_api::{
    ClientConfig, DEFAULT_CSRF_COOKIE, DEFAULT_CSRF_HEADER, HeaderName, SessionKind, TlsMode,
    TransportConfig,
};

/// Keyring service name under which passwords are stored.
pub const KEYRING_SERVICE: &str = "portico";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Share one in-flight session refresh between concurrent requests.
    #[serde(default)]
    pub coalesce_refresh: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            coalesce_refresh: false,
        }
    }
}

fn default_output() -> String {
    "json".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://portal.example.com"). Empty means
    /// every request path must be an absolute URL.
    #[serde(default)]
    pub base_url: String,

    /// Account type used until a session is established.
    #[serde(default)]
    pub session: SessionKind,

    /// Username for login.
    pub username: Option<String>,

    /// Password in plaintext. Prefer the keyring or an env var.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Cookie holding the anti-forgery token.
    pub csrf_cookie: Option<String>,

    /// Header the anti-forgery token is sent in.
    pub csrf_header: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override refresh coalescing.
    pub coalesce_refresh: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "portico", "portico").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("portico");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` layered under `PORTICO_*` environment variables.
///
/// Nested keys use a double underscore:
/// `PORTICO_PROFILES__PROD__BASE_URL=https://...`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PORTICO_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the login username: profile first, then `PORTICO_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("PORTICO_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the login password from the credential chain.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Well-known env var
    if let Ok(pw) = std::env::var("PORTICO_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name)) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name))?;
    entry.set_password(password)?;
    Ok(())
}

fn keyring_account(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

// ── Translation to client settings ──────────────────────────────────

/// Build client and transport settings from a profile and global defaults.
pub fn profile_to_client_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<(ClientConfig, TransportConfig), ConfigError> {
    let base_url = if profile.base_url.trim().is_empty() {
        None
    } else {
        Some(
            profile
                .base_url
                .parse::<url::Url>()
                .map_err(|e| ConfigError::Validation {
                    field: "base_url".into(),
                    reason: format!("invalid URL {:?}: {e}", profile.base_url),
                })?,
        )
    };

    let csrf_header = profile
        .csrf_header
        .as_deref()
        .unwrap_or(DEFAULT_CSRF_HEADER);
    let csrf_header =
        HeaderName::from_bytes(csrf_header.as_bytes()).map_err(|_| ConfigError::Validation {
            field: "csrf_header".into(),
            reason: format!("not a valid header name: {csrf_header:?}"),
        })?;

    let client = ClientConfig {
        base_url,
        csrf_cookie: profile
            .csrf_cookie
            .clone()
            .unwrap_or_else(|| DEFAULT_CSRF_COOKIE.into()),
        csrf_header,
        default_session: profile.session,
        coalesce_refresh: profile
            .coalesce_refresh
            .unwrap_or(defaults.coalesce_refresh),
    };

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    let transport = TransportConfig::default()
        .with_tls(tls)
        .with_timeout(timeout);

    Ok((client, transport))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            let cfg = load_config_from(&jail.directory().join("missing.toml")).unwrap();
            assert_eq!(cfg.default_profile.as_deref(), Some("default"));
            assert_eq!(cfg.defaults.timeout, 30);
            assert!(!cfg.defaults.coalesce_refresh);
            assert!(cfg.profiles.is_empty());
            Ok(())
        });
    }

    #[test]
    fn file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "prod"

                [defaults]
                timeout = 10

                [profiles.prod]
                base_url = "https://portal.example.com"
                session = "employee"
                username = "ada"
                "#,
            )?;
            jail.set_env("PORTICO_DEFAULTS__TIMEOUT", "5");
            jail.set_env("PORTICO_PROFILES__PROD__CSRF_COOKIE", "xsrf");

            let cfg = load_config_from(&jail.directory().join("config.toml")).unwrap();
            assert_eq!(cfg.default_profile.as_deref(), Some("prod"));
            assert_eq!(cfg.defaults.timeout, 5);

            let prod = &cfg.profiles["prod"];
            assert_eq!(prod.session, SessionKind::Employee);
            assert_eq!(prod.csrf_cookie.as_deref(), Some("xsrf"));
            assert_eq!(prod.username.as_deref(), Some("ada"));
            Ok(())
        });
    }

    #[test]
    fn profile_translation() {
        let profile = Profile {
            base_url: "https://portal.example.com/backend".into(),
            session: SessionKind::Employee,
            csrf_header: Some("X-XSRF-TOKEN".into()),
            timeout: Some(7),
            ..Profile::default()
        };
        let defaults = Defaults {
            coalesce_refresh: true,
            ..Defaults::default()
        };

        let (client, transport) = profile_to_client_config(&profile, &defaults).unwrap();
        assert_eq!(
            client.base_url.unwrap().as_str(),
            "https://portal.example.com/backend"
        );
        assert_eq!(client.csrf_cookie, "csrftoken");
        assert_eq!(client.csrf_header.as_str(), "x-xsrf-token");
        assert_eq!(client.default_session, SessionKind::Employee);
        assert!(client.coalesce_refresh);
        assert_eq!(transport.timeout, Duration::from_secs(7));
        assert!(matches!(transport.tls, TlsMode::System));
    }

    #[test]
    fn empty_base_url_means_absolute_paths() {
        let (client, _) =
            profile_to_client_config(&Profile::default(), &Defaults::default()).unwrap();
        assert!(client.base_url.is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_url = Profile {
            base_url: "not a url".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_client_config(&bad_url, &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "base_url"
        ));

        let bad_header = Profile {
            csrf_header: Some("bad header".into()),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_client_config(&bad_header, &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "csrf_header"
        ));
    }

    #[test]
    fn password_from_named_env_var() {
        Jail::expect_with(|jail| {
            jail.set_env("PORTAL_SECRET", "s3cret");
            let profile = Profile {
                password_env: Some("PORTAL_SECRET".into()),
                password: Some("plaintext".into()),
                ..Profile::default()
            };
            let pw = resolve_password(&profile, "test").unwrap();
            assert_eq!(secrecy::ExposeSecret::expose_secret(&pw), "s3cret");
            Ok(())
        });
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "local".into(),
            Profile {
                base_url: "http://localhost:8000".into(),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["local"].base_url, "http://localhost:8000");
    }
}
