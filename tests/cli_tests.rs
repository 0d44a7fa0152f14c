//! CLI behaviour that does not need a terminal

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("smart-suggest").unwrap()
}

#[test]
fn test_help_lists_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--preset"))
        .stdout(predicate::str::contains("--suggest-url"))
        .stdout(predicate::str::contains("--log-file"));
}

#[test]
fn test_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_file_and_preset_conflict() {
    cmd()
        .args(["report.docx", "--preset", "sample"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_unknown_preset_rejected() {
    cmd()
        .args(["--preset", "brochure"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("protocol"))
        .stderr(predicate::str::contains("sample"));
}

#[test]
fn test_non_websocket_suggest_url_fails_before_ui() {
    cmd()
        .args(["--suggest-url", "https://example.com/ws"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected ws:// or wss://"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    cmd()
        .arg("--config")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_invalid_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[suggest]\ndebounce_ms = \"soon\"\n").unwrap();

    cmd()
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}
