mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use portico_api::{ApiClient, SessionContext, SessionKind};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a backend
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "portico", &mut std::io::stdout());
            Ok(())
        }

        Command::Endpoints(args) => {
            let cfg = config::load_config_or_default();
            let kind = default_session(&cli.global, &cfg);
            commands::endpoints::handle(&args, kind, &cli.global);
            Ok(())
        }

        cmd => {
            let cfg = config::load_config_or_default();
            let (client_config, transport) = config::resolve_client(&cli.global, &cfg)?;
            if client_config.base_url.is_none() && !targets_absolute_url(&cmd) {
                return Err(CliError::NoConfig {
                    path: config::config_path().display().to_string(),
                });
            }

            let session = SessionContext::new();
            let client = ApiClient::new(client_config, &transport, Arc::clone(&session))?;
            let _guard = session.register_unauthorized_handler(|| {
                warn!("session expired and could not be refreshed");
            });

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &client, &cli.global, &cfg).await
        }
    }
}

fn default_session(global: &GlobalOpts, cfg: &config::Config) -> SessionKind {
    global
        .session
        .map_or_else(|| config::active_profile(global, cfg).1.session, Into::into)
}

/// A raw request to an absolute URL can run without a base URL.
fn targets_absolute_url(cmd: &Command) -> bool {
    matches!(cmd, Command::Request(args) if portico_api::absolute_url(&args.path).is_some())
}
