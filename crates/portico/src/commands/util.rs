//! Shared helpers for command handlers.

use std::path::Path;

use portico_api::{Envelope, HeaderName, HeaderValue};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Print an envelope and turn an unsuccessful one into an error.
pub fn finish(envelope: &Envelope, global: &GlobalOpts) -> Result<(), CliError> {
    let rendered = output::render_envelope(&global.output, envelope);
    output::print_output(&rendered, global.quiet);
    if envelope.ok {
        Ok(())
    } else {
        Err(CliError::from_envelope(envelope))
    }
}

/// Whether a login response asks for a second factor.
pub fn requires_otp(envelope: &Envelope) -> bool {
    ["otp_required", "requires_otp", "two_factor_required"]
        .iter()
        .any(|key| envelope.data.get(key).and_then(serde_json::Value::as_bool) == Some(true))
}

/// Parse a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), CliError> {
    let invalid = |reason: String| CliError::Validation {
        field: "header".into(),
        reason,
    };
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| invalid(format!("expected 'Name: value', got {raw:?}")))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| invalid(format!("{name:?}: {e}")))?;
    let value =
        HeaderValue::from_str(value.trim()).map_err(|e| invalid(format!("{value:?}: {e}")))?;
    Ok((name, value))
}

/// Parse a `name=value` argument.
pub fn parse_pair<'a>(raw: &'a str, field: &str) -> Result<(&'a str, &'a str), CliError> {
    raw.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| CliError::Validation {
            field: field.into(),
            reason: format!("expected NAME=VALUE, got {raw:?}"),
        })
}

/// Parse an inline JSON argument.
pub fn parse_json(raw: &str) -> Result<serde_json::Value, CliError> {
    serde_json::from_str(raw).map_err(|e| CliError::Validation {
        field: "data".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Read and parse a JSON file for `--data-file` flags.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "data-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}
