//! `portico endpoints`: show the logical endpoint table.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use portico_api::{Endpoint, SessionKind};

use crate::cli::{EndpointsArgs, GlobalOpts};
use crate::output;

#[derive(Debug, Serialize)]
struct EndpointEntry {
    kind: SessionKind,
    endpoint: String,
    path: &'static str,
}

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Account")]
    kind: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Path")]
    path: &'static str,
}

fn entries(kinds: &[SessionKind]) -> Vec<EndpointEntry> {
    kinds
        .iter()
        .flat_map(|&kind| {
            Endpoint::iter().map(move |endpoint| EndpointEntry {
                kind,
                endpoint: endpoint.to_string(),
                path: kind.path(endpoint),
            })
        })
        .collect()
}

pub fn handle(args: &EndpointsArgs, default: SessionKind, global: &GlobalOpts) {
    let kinds: Vec<SessionKind> = if args.all {
        SessionKind::iter().collect()
    } else {
        vec![default]
    };

    let data = entries(&kinds);
    let rendered = output::render_list(
        &global.output,
        &data,
        |e| EndpointRow {
            kind: e.kind.to_string(),
            endpoint: e.endpoint.clone(),
            path: e.path,
        },
        |e| e.path.to_owned(),
    );
    output::print_output(&rendered, global.quiet);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_row_per_endpoint_and_kind() {
        let per_kind = Endpoint::iter().count();
        assert_eq!(entries(&[SessionKind::Staff]).len(), per_kind);
        assert_eq!(
            entries(&[SessionKind::Staff, SessionKind::Employee]).len(),
            per_kind * 2
        );
        assert!(
            entries(&[SessionKind::Employee])
                .iter()
                .all(|e| e.path.starts_with("/api/employee/"))
        );
    }
}
