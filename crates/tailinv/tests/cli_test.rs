//! Integration tests for the `tailinv` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a network. The end-to-end tests point the binary at a local
//! wiremock server standing in for the Tailscale API.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{bearer_token, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `tailinv` binary with env isolation.
///
/// Clears every variable the CLI reads and points config directories at
/// a scratch path so tests never touch the user's real configuration.
fn tailinv_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("tailinv");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TAILINV_CONFIG")
        .env_remove("TAILINV_TOKEN_CACHE")
        .env_remove("TAILINV_TIMEOUT")
        .env_remove("TAILSCALE_CLIENT_ID")
        .env_remove("TAILSCALE_CLIENT_SECRET")
        .env_remove("TAILNET_NAME")
        .env_remove("TAILNET")
        .env_remove("TAILINV_TAILNET");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A scratch home plus a mock Tailscale API.
struct Env {
    home: TempDir,
    server: MockServer,
}

impl Env {
    async fn start() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
            server: MockServer::start().await,
        }
    }

    fn cache(&self) -> std::path::PathBuf {
        self.home.path().join("token.json")
    }

    /// Command wired to the mock server with complete credentials.
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = self.cmd_without_tailnet();
        cmd.args(["--tailnet", "example.com"]);
        cmd
    }

    fn cmd_without_tailnet(&self) -> assert_cmd::Command {
        let mut cmd = tailinv_cmd(self.home.path());
        cmd.args(["--client-id", "k123", "--client-secret", "s3cret"])
            .arg("--api-base")
            .arg(format!("{}/api/v2", self.server.uri()))
            .arg("--token-url")
            .arg(format!("{}/api/v2/oauth/token", self.server.uri()))
            .arg("--token-cache")
            .arg(self.cache())
            .args(["--timeout", "5"]);
        cmd
    }

    async fn mount_token(&self) {
        Mock::given(method("POST"))
            .and(path("/api/v2/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tskey-api-e2e",
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .mount(&self.server)
            .await;
    }

    async fn mount_devices(&self) {
        Mock::given(method("GET"))
            .and(path("/api/v2/tailnet/example.com/devices"))
            .and(bearer_token("tskey-api-e2e"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "devices": [
                    { "id": "1", "hostname": "a", "addresses": ["10.0.0.1"], "tags": ["tag:web", "tag:prod"] },
                    { "id": "2", "hostname": "b", "addresses": ["10.0.0.2"], "tags": ["tag:db"] },
                    { "id": "3", "hostname": "c", "addresses": ["10.0.0.3"] },
                ]
            })))
            .mount(&self.server)
            .await;
    }
}

/// Run the (blocking) binary off the async runtime so the mock server
/// keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", combined_output(output)))
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = tailinv_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    tailinv_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("inventory")
            .and(predicate::str::contains("nodes"))
            .and(predicate::str::contains("token"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    tailinv_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tailinv"));
}

#[test]
fn test_list_and_host_conflict() {
    let home = tempfile::tempdir().unwrap();
    tailinv_cmd(home.path())
        .args(["inventory", "--list", "--host", "a"])
        .assert()
        .code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    tailinv_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    tailinv_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_inventory_without_client_id_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let output = tailinv_cmd(home.path())
        .args(["inventory", "--list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("client_id"));
}

#[test]
fn test_missing_config_file_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    tailinv_cmd(home.path())
        .arg("--config")
        .arg(home.path().join("absent.toml"))
        .args(["config", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_foreign_plugin_file_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("hosts.aws_ec2.yml");
    std::fs::write(&file, "plugin: amazon.aws.aws_ec2\n").unwrap();

    tailinv_cmd(home.path())
        .arg("--config")
        .arg(&file)
        .args(["config", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("plugin"));
}

#[test]
fn test_config_path_honours_flag() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("custom.toml");
    tailinv_cmd(home.path())
        .arg("--config")
        .arg(&file)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_show_redacts_secret_and_templates() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("inventory.tailscale.yaml");
    std::fs::write(
        &file,
        "plugin: tailscale\n\
         client_id: \"{{ lookup('env', 'TS_TEST_CLIENT_ID') }}\"\n\
         client_secret: plaintext-secret\n\
         tailnet: example.com\n\
         tags: [web]\n",
    )
    .unwrap();

    let output = tailinv_cmd(home.path())
        .env("TS_TEST_CLIENT_ID", "k-from-env")
        .arg("--config")
        .arg(&file)
        .args(["-o", "json", "config", "show"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let shown = stdout_json(&output);
    assert_eq!(shown["client_id"], "k-from-env");
    assert_eq!(shown["client_secret"], "********");
    assert_eq!(shown["tags"], json!(["web"]));
    assert!(!combined_output(&output).contains("plaintext-secret"));
}

// ── Token cache ─────────────────────────────────────────────────────

#[test]
fn test_token_status_missing() {
    let home = tempfile::tempdir().unwrap();
    tailinv_cmd(home.path())
        .arg("--token-cache")
        .arg(home.path().join("token.json"))
        .args(["-o", "plain", "token", "status"])
        .assert()
        .success()
        .stdout(predicate::str::diff("missing\n"));
}

#[test]
fn test_token_clear_removes_cache() {
    let home = tempfile::tempdir().unwrap();
    let cache = home.path().join("token.json");
    std::fs::write(&cache, r#"{"access_token":"x","token_type":"Bearer"}"#).unwrap();

    tailinv_cmd(home.path())
        .arg("--token-cache")
        .arg(&cache)
        .args(["token", "clear"])
        .assert()
        .success();

    assert!(!cache.exists());
}

// ── End to end ──────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_inventory_list_end_to_end() {
    let env = Env::start().await;
    env.mount_token().await;
    env.mount_devices().await;

    let mut cmd = env.cmd();
    cmd.args(["inventory", "--list", "web"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        stdout_json(&output),
        json!({
            "_meta": { "hostvars": { "a": { "ansible_host": "10.0.0.1" } } },
            "all": { "children": ["ungrouped", "tag_web", "tag_prod"] },
            "tag_web": { "hosts": ["a"] },
            "tag_prod": { "hosts": ["a"] },
            "ungrouped": { "hosts": [] },
        })
    );
    assert!(env.cache().exists(), "token was not cached");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tailnet_falls_back_to_plain_env_var() {
    let env = Env::start().await;
    env.mount_token().await;
    env.mount_devices().await;

    let mut cmd = env.cmd_without_tailnet();
    cmd.env("TAILNET", "example.com").args(["nodes", "-o", "plain"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("a\t10.0.0.1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_inventory_host_end_to_end() {
    let env = Env::start().await;
    env.mount_token().await;
    env.mount_devices().await;

    let mut cmd = env.cmd();
    cmd.args(["inventory", "--host", "c"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(stdout_json(&output), json!({ "ansible_host": "10.0.0.3" }));

    let mut cmd = env.cmd();
    cmd.args(["inventory", "--host", "nope"]);
    let output = run(cmd).await;
    assert_eq!(stdout_json(&output), json!({}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nodes_json_end_to_end() {
    let env = Env::start().await;
    env.mount_token().await;
    env.mount_devices().await;

    let mut cmd = env.cmd();
    cmd.args(["-o", "json", "nodes"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let nodes = stdout_json(&output);
    assert_eq!(nodes.as_array().unwrap().len(), 3);
    assert_eq!(nodes[1]["hostname"], "b");
    assert_eq!(nodes[1]["address"], "10.0.0.2");
    assert_eq!(nodes[1]["groups"], json!(["tag_db"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_credentials_exit_with_auth_code() {
    let env = Env::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid client"))
        .mount(&env.server)
        .await;

    let mut cmd = env.cmd();
    cmd.args(["inventory", "--list"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(output.stdout.is_empty(), "nothing may reach stdout on failure");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_tailnet_exits_with_not_found() {
    let env = Env::start().await;
    env.mount_token().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/tailnet/example.com/devices"))
        .respond_with(ResponseTemplate::new(404).set_body_string("tailnet not found"))
        .mount(&env.server)
        .await;

    let mut cmd = env.cmd();
    cmd.args(["nodes"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_token_refresh_writes_cache() {
    let env = Env::start().await;
    env.mount_token().await;

    let mut cmd = env.cmd();
    cmd.args(["token", "refresh"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let cached: Value = serde_json::from_str(&std::fs::read_to_string(env.cache()).unwrap()).unwrap();
    assert_eq!(cached["access_token"], "tskey-api-e2e");
}
