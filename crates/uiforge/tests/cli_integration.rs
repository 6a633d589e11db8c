//! CLI integration tests for the uiforge command-line interface.
//!
//! These tests do not start a server; they cover argument parsing and the
//! config subcommands.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A uiforge command isolated to `dir` for both user config and cwd.
fn uiforge(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("uiforge").unwrap();
    cmd.env("UIFORGE_CONFIG_DIR", dir.path())
        .env_remove("UIFORGE_CONFIG")
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG")
        .current_dir(dir.path());
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    uiforge(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    uiforge(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("uiforge"));
}

#[test]
fn test_start_help_shows_overrides() {
    let dir = TempDir::new().unwrap();
    uiforge(&dir)
        .args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--redis-url"))
        .stdout(predicate::str::contains("--db"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    uiforge(&dir).arg("frobnicate").assert().failure();
}

#[test]
fn test_config_path_uses_env_override() {
    let dir = TempDir::new().unwrap();
    uiforge(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(
            dir.path().to_string_lossy().into_owned(),
        ));
}

#[test]
fn test_config_show_defaults() {
    let dir = TempDir::new().unwrap();
    uiforge(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No config files loaded"))
        .stdout(predicate::str::contains("127.0.0.1:8080"))
        .stdout(predicate::str::contains("local mode"))
        .stdout(predicate::str::contains("no key"));
}

#[test]
fn test_config_show_reads_project_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("uiforge.toml"),
        "[server]\nport = 9123\n\n[auth.tokens]\nalice = \"t\"\n",
    )
    .unwrap();

    uiforge(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:9123"))
        .stdout(predicate::str::contains("token users: alice"));
}

#[test]
fn test_config_init_local_then_which() {
    let dir = TempDir::new().unwrap();
    uiforge(&dir)
        .args(["config", "init", "--local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));
    assert!(dir.path().join("uiforge.toml").is_file());

    uiforge(&dir)
        .args(["config", "which"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 config file(s) loaded."));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[cache]\nbackend = \"redis\"\n").unwrap();

    uiforge(&dir)
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("redis_url"));
}
