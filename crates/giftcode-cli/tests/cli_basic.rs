//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Each test
//! points HOME at its own temp dir so sessions never share a database.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "giftcode-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env_remove("GIFTCODE_ENV")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(home: &Path, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_game_status() {
    let home = tempfile::tempdir().unwrap();
    let status = run_json(home.path(), &["game", "status"]);
    assert_eq!(status["time_left"], 900);
    assert_eq!(status["player_name"], "Dominik");
    assert_eq!(status["code"], "?????");
}

#[test]
fn test_game_locked_lists_chain() {
    let home = tempfile::tempdir().unwrap();
    let locks = run_json(home.path(), &["game", "locked"]);
    let locks = locks.as_array().unwrap();
    assert_eq!(locks.len(), 7);
    assert_eq!(locks[0]["challenge"], "memory");
    assert_eq!(locks[0]["locked"], false);
    assert_eq!(locks[1]["locked"], true);
}

#[test]
fn test_complete_locked_challenge_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["game", "complete", "maze"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("locked"), "unexpected stderr: {stderr}");
}

#[test]
fn test_complete_persists_between_runs() {
    let home = tempfile::tempdir().unwrap();
    let events = run_json(home.path(), &["game", "complete", "memory"]);
    assert_eq!(events[0]["type"], "ChallengeCompleted");
    assert_eq!(events[0]["digit"], "7");

    let progress = run_json(home.path(), &["game", "progress"]);
    assert_eq!(progress["completed"], 1);
    assert_eq!(progress["total"], 6);

    let entered = run_json(home.path(), &["game", "enter", "puzzle"]);
    assert_eq!(entered["path"], "/game/puzzle/");
    assert_eq!(entered["screen"]["screen"], "challenge");
}

#[test]
fn test_tick_and_bonus() {
    let home = tempfile::tempdir().unwrap();
    let ticks = run_json(home.path(), &["game", "tick", "--count", "3"]);
    assert_eq!(ticks.as_array().unwrap().len(), 3);

    let bonus = run_json(home.path(), &["game", "bonus", "15"]);
    assert_eq!(bonus["type"], "TimeBonusAdded");
    assert_eq!(bonus["time_left"], 912);
}

#[test]
fn test_submit_before_unlock_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["game", "submit", "73921"]);
    assert_ne!(code, 0);
}

#[test]
fn test_reset() {
    let home = tempfile::tempdir().unwrap();
    run_json(home.path(), &["game", "complete", "memory"]);
    let reset = run_json(home.path(), &["game", "reset"]);
    assert_eq!(reset["type"], "GameReset");
    let progress = run_json(home.path(), &["game", "progress"]);
    assert_eq!(progress["completed"], 0);
}

#[test]
fn test_config_get_and_set() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "session.duration_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "900");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "session.duration_secs", "60"]);
    assert_eq!(code, 0);
    let status = run_json(home.path(), &["game", "status"]);
    assert_eq!(status["time_left"], 60);
}

#[test]
fn test_config_get_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "get", "nope.nothing"]);
    assert_ne!(code, 0);
}

#[test]
fn test_completions() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("giftcode-cli"));
}
