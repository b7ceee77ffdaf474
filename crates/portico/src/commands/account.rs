//! Account commands: profile, password, and two-factor management.

use portico_api::ApiClient;
use secrecy::SecretString;

use crate::cli::{
    GlobalOpts, PasswordArgs, PasswordCommand, ProfileArgs, ProfileCommand, TwoFactorArgs,
    TwoFactorCommand,
};
use crate::commands::{session, util};
use crate::config::Config;
use crate::error::CliError;

pub async fn handle_profile(
    client: &ApiClient,
    args: ProfileArgs,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    // Validate input before touching the network.
    let changes = match args.command {
        ProfileCommand::Show => None,
        ProfileCommand::Update { ref data } => Some(util::parse_json(data)?),
    };

    session::ensure_session(client, global, cfg).await?;
    let envelope = match changes {
        None => client.fetch_profile().await,
        Some(changes) => client.update_profile(changes).await,
    };
    util::finish(&envelope, global)
}

pub async fn handle_password(
    client: &ApiClient,
    args: PasswordArgs,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    let kind = client.config().default_session;
    let envelope = match args.command {
        PasswordCommand::Forgot { email } => client.forgot_password(kind, &email).await,
        PasswordCommand::Reset { token } => {
            let new_password = prompt_secret("New password: ")?;
            client.reset_password(kind, &token, &new_password).await
        }
        PasswordCommand::Change => {
            let current = prompt_secret("Current password: ")?;
            let new_password = prompt_secret("New password: ")?;
            session::ensure_session(client, global, cfg).await?;
            client.change_password(&current, &new_password).await
        }
    };
    util::finish(&envelope, global)
}

pub async fn handle_two_factor(
    client: &ApiClient,
    args: TwoFactorArgs,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    session::ensure_session(client, global, cfg).await?;
    let envelope = match args.command {
        TwoFactorCommand::Enable => client.enable_2fa().await,
        TwoFactorCommand::Disable => client.disable_2fa().await,
        TwoFactorCommand::RequestOtp => client.request_otp().await,
    };
    util::finish(&envelope, global)
}

fn prompt_secret(prompt: &str) -> Result<SecretString, CliError> {
    let value = rpassword::prompt_password(prompt)?;
    if value.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(value))
}
