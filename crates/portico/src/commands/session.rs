//! Session commands: login, session restore, logout.

use dialoguer::Input;
use portico_api::{ApiClient, Envelope};
use serde_json::json;
use tracing::debug;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::commands::util;
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Log in with the resolved credentials, completing an OTP challenge if
/// the backend asks for one.
pub async fn login(
    client: &ApiClient,
    global: &GlobalOpts,
    cfg: &Config,
    otp: Option<String>,
) -> Result<Envelope, CliError> {
    let username =
        config::resolve_username(global, cfg).ok_or_else(|| CliError::NoCredentials {
            profile: config::active_profile_name(global, cfg),
        })?;
    let password = config::resolve_password(global, cfg)?;
    let kind = client.config().default_session;

    let envelope = client.login(kind, &username, &password).await;
    if !envelope.ok {
        return Err(login_failed(&envelope));
    }
    if !util::requires_otp(&envelope) {
        return Ok(envelope);
    }

    let code = match otp {
        Some(code) => code,
        None => Input::<String>::new()
            .with_prompt("One-time password")
            .interact_text()
            .map_err(|e| CliError::Validation {
                field: "otp".into(),
                reason: format!("prompt failed: {e}"),
            })?,
    };
    let envelope = client.verify_otp(code.trim()).await;
    if envelope.ok {
        Ok(envelope)
    } else {
        Err(login_failed(&envelope))
    }
}

/// Log in when credentials are available; otherwise continue without a
/// session and let the backend decide.
pub async fn ensure_session(
    client: &ApiClient,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    if config::resolve_username(global, cfg).is_some() {
        login(client, global, cfg, None).await?;
    } else {
        debug!("no credentials configured, continuing without login");
    }
    Ok(())
}

fn login_failed(envelope: &Envelope) -> CliError {
    if envelope.status == 0 {
        return CliError::from_envelope(envelope);
    }
    CliError::LoginFailed {
        status: envelope.status,
        message: envelope
            .error_message()
            .map_or_else(|| envelope.data.to_string(), String::from),
    }
}

pub async fn handle_login(
    client: &ApiClient,
    args: LoginArgs,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    let envelope = login(client, global, cfg, args.otp).await?;
    util::finish(&envelope, global)
}

pub async fn handle_session(client: &ApiClient, global: &GlobalOpts) -> Result<(), CliError> {
    match client.restore_session().await {
        Some(kind) => {
            let rendered = output::render_json_pretty(&json!({ "session": kind }));
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
        None => Err(CliError::Unauthorized { status: 401 }),
    }
}

pub async fn handle_logout(
    client: &ApiClient,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    ensure_session(client, global, cfg).await?;
    let envelope = client.logout().await;
    util::finish(&envelope, global)
}
