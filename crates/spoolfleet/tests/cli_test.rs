//! Integration tests for the `spoolfleet` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling — all without requiring a live backend.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `spoolfleet` binary with env isolation.
///
/// Clears all `SPOOLFLEET_*` env vars and points config directories at
/// a nonexistent path so tests never touch the user's real config.
fn spoolfleet_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("spoolfleet");
    cmd.env("HOME", "/tmp/spoolfleet-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/spoolfleet-cli-test-nonexistent")
        .env_remove("SPOOLFLEET_API_KEY")
        .env_remove("SPOOLFLEET_BACKEND_URL");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = spoolfleet_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    spoolfleet_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("spools")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("queue"))
            .and(predicate::str::contains("clear-plate"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    spoolfleet_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spoolfleet"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    spoolfleet_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    spoolfleet_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    spoolfleet_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = spoolfleet_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_spools_list_without_api_key() {
    // No config file and no API key: the credential chain is empty.
    let output = spoolfleet_cmd().args(["spools", "list"]).output().unwrap();
    assert!(!output.status.success(), "Expected failure without API key");
    let text = combined_output(&output);
    assert!(
        text.contains("API key") || text.contains("api_key") || text.contains("config"),
        "Expected error about missing API key:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let output = spoolfleet_cmd()
        .args(["--output", "invalid", "spools", "list"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid output format"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid")
            || text.contains("possible values")
            || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_global_flags_parsing() {
    // All flags should parse correctly — the failure should be about
    // credentials, not about argument parsing.
    let output = spoolfleet_cmd()
        .args([
            "--output",
            "json",
            "--verbose",
            "--timeout",
            "60",
            "spools",
            "list",
        ])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        !text.contains("unexpected argument"),
        "Flags failed to parse:\n{text}"
    );
}

#[test]
fn test_queue_requires_printer_id() {
    let output = spoolfleet_cmd().arg("queue").output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage error");
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_spools_subcommands_exist() {
    spoolfleet_cmd()
        .args(["spools", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_spools_list_flags_exist() {
    spoolfleet_cmd()
        .args(["spools", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--archived"));
}

#[test]
fn test_queue_flags_exist() {
    spoolfleet_cmd()
        .args(["queue", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--all"));
}

#[test]
fn test_config_subcommands_exist() {
    spoolfleet_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("path")),
        );
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_show_without_file_renders_defaults() {
    spoolfleet_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[backend]"));
}

#[test]
fn test_config_path_prints_a_path() {
    spoolfleet_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_file_flag_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(
        &path,
        "[backend]\nurl = \"http://fleet.example:9000\"\n",
    )
    .unwrap();

    spoolfleet_cmd()
        .args(["--config", path.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fleet.example"));
}
