//! `portico request`: send an arbitrary request through the client.

use portico_api::{ApiClient, Method, MultipartForm, RequestOptions};
use tracing::debug;

use crate::cli::{GlobalOpts, RequestArgs};
use crate::commands::{session, util};
use crate::config::Config;
use crate::error::CliError;

pub async fn handle(
    client: &ApiClient,
    args: RequestArgs,
    global: &GlobalOpts,
    config: &Config,
) -> Result<(), CliError> {
    let options = build_options(&args)?;

    if args.login {
        session::login(client, global, config, None).await?;
    }

    debug!(method = %options.method, path = %args.path, "sending request");
    let envelope = client.request(&args.path, options).await;
    util::finish(&envelope, global)
}

fn build_options(args: &RequestArgs) -> Result<RequestOptions, CliError> {
    let method =
        Method::from_bytes(args.method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            CliError::Validation {
                field: "method".into(),
                reason: format!("not an HTTP method: {:?}", args.method),
            }
        })?;

    let mut options = RequestOptions::new(method);
    if !args.no_auth {
        options = options.with_auth();
    }

    if let Some(ref raw) = args.data {
        options = options.json(util::parse_json(raw)?);
    } else if let Some(ref path) = args.data_file {
        options = options.json(util::read_json_file(path)?);
    } else if !args.form.is_empty() || !args.file.is_empty() {
        options = options.multipart(build_form(args)?);
    }

    for raw in &args.header {
        let (name, value) = util::parse_header(raw)?;
        options = options.header(name, value);
    }

    Ok(options)
}

fn build_form(args: &RequestArgs) -> Result<MultipartForm, CliError> {
    let mut form = MultipartForm::new();
    for raw in &args.form {
        let (name, value) = util::parse_pair(raw, "form")?;
        form = form.text(name, value);
    }
    for raw in &args.file {
        let (name, path) = util::parse_pair(raw, "file")?;
        let path = std::path::Path::new(path);
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| name.to_owned(), |n| n.to_string_lossy().into_owned());
        form = form.file(name, file_name, bytes, None);
    }
    Ok(form)
}
