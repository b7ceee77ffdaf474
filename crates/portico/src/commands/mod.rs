//! Command dispatch: bridges CLI args to client calls and output formatting.

pub mod account;
pub mod config_cmd;
pub mod endpoints;
pub mod request;
pub mod session;
pub mod util;

use portico_api::ApiClient;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &ApiClient,
    global: &GlobalOpts,
    config: &Config,
) -> Result<(), CliError> {
    match cmd {
        Command::Request(args) => request::handle(client, args, global, config).await,
        Command::Login(args) => session::handle_login(client, args, global, config).await,
        Command::Session => session::handle_session(client, global).await,
        Command::Logout => session::handle_logout(client, global, config).await,
        Command::Profile(args) => account::handle_profile(client, args, global, config).await,
        Command::Password(args) => account::handle_password(client, args, global, config).await,
        Command::TwoFactor(args) => {
            account::handle_two_factor(client, args, global, config).await
        }
        // Handled before a client is built
        Command::Endpoints(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
