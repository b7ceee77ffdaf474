//! CLI configuration: thin wrapper around `portico_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--base-url, --as, --username, etc.).

use secrecy::SecretString;

use portico_api::{ClientConfig, TlsMode, TransportConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use portico_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The profile selected by flags, or an empty one when none is configured.
pub fn active_profile(global: &GlobalOpts, config: &Config) -> (String, Profile) {
    let name = active_profile_name(global, config);
    let profile = config.profiles.get(&name).cloned().unwrap_or_default();
    (name, profile)
}

/// Translate the active profile + global flags into client settings.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_client(
    global: &GlobalOpts,
    config: &Config,
) -> Result<(ClientConfig, TransportConfig), CliError> {
    let (_, mut profile) = active_profile(global, config);

    // 1. Base URL (flag / env > profile)
    if let Some(ref base_url) = global.base_url {
        profile.base_url.clone_from(base_url);
    }

    // 2. Account type
    if let Some(session) = global.session {
        profile.session = session.into();
    }

    // 3. Transport overrides
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    if global.coalesce_refresh {
        profile.coalesce_refresh = Some(true);
    }

    let (client, mut transport) =
        portico_config::profile_to_client_config(&profile, &config.defaults)?;

    if global.insecure {
        transport = transport.with_tls(TlsMode::DangerAcceptInvalid);
    }

    Ok((client, transport))
}

/// Resolve the username: `--username` > profile > `PORTICO_USERNAME`.
pub fn resolve_username(global: &GlobalOpts, config: &Config) -> Option<String> {
    let (name, profile) = active_profile(global, config);
    global
        .username
        .clone()
        .or_else(|| portico_config::resolve_username(&profile, &name).ok())
}

/// Resolve the password from the credential chain, prompting as a last resort.
pub fn resolve_password(global: &GlobalOpts, config: &Config) -> Result<SecretString, CliError> {
    let (name, profile) = active_profile(global, config);
    match portico_config::resolve_password(&profile, &name) {
        Ok(secret) => Ok(secret),
        Err(portico_config::ConfigError::NoCredentials { profile }) => {
            if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
                return Err(CliError::NoCredentials { profile });
            }
            let pw = rpassword::prompt_password("Password: ")?;
            Ok(SecretString::from(pw))
        }
        Err(e) => Err(e.into()),
    }
}
