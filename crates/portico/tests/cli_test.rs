//! Integration tests for the `portico` CLI binary.
//!
//! Argument parsing, help output, completions, and a few end-to-end
//! requests against a mock backend.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `portico` binary with env isolation.
///
/// Clears all `PORTICO_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn portico_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("portico");
    cmd.env("HOME", "/tmp/portico-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/portico-cli-test-nonexistent")
        .env_remove("PORTICO_PROFILE")
        .env_remove("PORTICO_BASE_URL")
        .env_remove("PORTICO_SESSION")
        .env_remove("PORTICO_USERNAME")
        .env_remove("PORTICO_PASSWORD")
        .env_remove("PORTICO_OUTPUT")
        .env_remove("PORTICO_INSECURE")
        .env_remove("PORTICO_TIMEOUT");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = portico_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    portico_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("request")
            .and(predicate::str::contains("login"))
            .and(predicate::str::contains("endpoints")),
    );
}

#[test]
fn test_version_flag() {
    portico_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("portico"));
}

#[test]
fn test_completions_bash() {
    portico_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_session_kind_rejected() {
    let output = portico_cmd()
        .args(["--as", "manager", "endpoints"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_endpoints_for_employee() {
    portico_cmd()
        .args(["--as", "employee", "-o", "plain", "endpoints"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("/api/employee/token/refresh/")
                .and(predicate::str::contains("/api/staff/").not()),
        );
}

#[test]
fn test_endpoints_all_lists_both_kinds() {
    portico_cmd()
        .args(["-o", "plain", "endpoints", "--all"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("/api/staff/login/")
                .and(predicate::str::contains("/api/employee/login/")),
        );
}

#[test]
fn test_config_path() {
    portico_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Error handling ──────────────────────────────────────────────────

#[test]
fn test_missing_base_url_is_usage_error() {
    let output = portico_cmd()
        .args(["request", "GET", "/tickets/"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("No base URL"), "unexpected output:\n{text}");
}

#[test]
fn test_invalid_json_body_is_usage_error() {
    let output = portico_cmd()
        .args([
            "--base-url",
            "http://127.0.0.1:9",
            "request",
            "POST",
            "/tickets/",
            "--data",
            "{nope",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unreachable_backend_is_connection_error() {
    let output = portico_cmd()
        .args(["--base-url", "http://127.0.0.1:9", "request", "GET", "/x/"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"status\": 0"), "unexpected stdout:\n{stdout}");
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_request_prints_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tickets/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": 7 }])))
        .mount(&server)
        .await;

    portico_cmd()
        .args([
            "--base-url",
            &server.uri(),
            "-o",
            "json-compact",
            "request",
            "get",
            "/api/tickets/",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"ok":true,"status":200,"data":[{"id":7}]}"#,
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_absolute_url_runs_without_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "up": true })))
        .expect(1)
        .mount(&server)
        .await;

    let upper = server.uri().replacen("http://", "HTTP://", 1);
    portico_cmd()
        .args(["-o", "plain", "request", "GET", &format!("{upper}/api/health/")])
        .assert()
        .success()
        .stdout(predicate::str::contains("200 ok"));
}

#[test]
fn test_non_http_scheme_needs_base_url() {
    let output = portico_cmd()
        .args(["request", "GET", "ftp://files.example.com/x"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_not_found_maps_to_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/missing/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({ "detail": "Not found." })),
        )
        .mount(&server)
        .await;

    let output = portico_cmd()
        .args(["--base-url", &server.uri(), "request", "GET", "/api/missing/"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("Not found."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_posts_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/employee/login/"))
        .and(body_json(serde_json::json!({
            "username": "ada",
            "password": "s3cret",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    portico_cmd()
        .env("PORTICO_PASSWORD", "s3cret")
        .args([
            "--base-url",
            &server.uri(),
            "--as",
            "employee",
            "--username",
            "ada",
            "-o",
            "plain",
            "login",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("200 ok"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_login_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/staff/login/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "error": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let output = portico_cmd()
        .env("PORTICO_PASSWORD", "wrong")
        .args(["--base-url", &server.uri(), "--username", "ada", "login"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Invalid credentials"));
}
