//! Output formatting: JSON, YAML, table, plain.
//!
//! Renders envelopes and endpoint listings in the format selected by
//! `--output`. Tables use `tabled`, structured formats use serde.

use std::io::{self, Write};

use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use portico_api::Envelope;

use crate::cli::OutputFormat;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a response envelope.
///
/// - `json` / `json-compact` / `yaml`: the full `{ok, status, data}` shape
/// - `table`: one row per top-level field of `data`
/// - `plain`: `<status> <ok|error>`
pub fn render_envelope(format: &OutputFormat, envelope: &Envelope) -> String {
    match format {
        OutputFormat::Json => render_json_pretty(envelope),
        OutputFormat::JsonCompact => render_json_compact(envelope),
        OutputFormat::Yaml => render_yaml(envelope),
        OutputFormat::Table => render_data_table(envelope),
        OutputFormat::Plain => {
            let outcome = if envelope.ok { "ok" } else { "error" };
            format!("{} {outcome}", envelope.status)
        }
    }
}

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn render_data_table(envelope: &Envelope) -> String {
    let rows: Vec<FieldRow> = match &envelope.data {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| FieldRow {
                field: k.clone(),
                value: scalar(v),
            })
            .collect(),
        other => vec![FieldRow {
            field: "data".into(),
            value: scalar(other),
        }],
    };
    let header = format!("HTTP {} ({})", envelope.status, if envelope.ok { "ok" } else { "error" });
    if rows.is_empty() {
        return header;
    }
    format!("{header}\n{}", render_table(&rows))
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Pretty-printed JSON.
pub(crate) fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("<serialization error: {e}>"))
}

/// Compact single-line JSON.
pub(crate) fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|e| format!("<serialization error: {e}>"))
}

/// YAML output.
pub(crate) fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("<serialization error: {e}>"))
}
