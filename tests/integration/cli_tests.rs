//! Integration tests for the CLI binary.
//!
//! Drives the `tl` binary against a temporary data directory.
//!
//! This test is registered as a [[test]] in the trustlend-cli crate
//! so that CARGO_BIN_EXE_tl is available.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

/// Get a Command pointing to the `tl` binary with an isolated home.
fn tl(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tl"));
    cmd.arg("--home").arg(home).env_remove("TRUSTLEND_USER");
    cmd
}

fn run_ok(cmd: &mut Command) -> Output {
    let output = cmd.output().expect("failed to execute tl");
    assert!(
        output.status.success(),
        "tl should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn json_out(cmd: &mut Command) -> Value {
    let output = run_ok(cmd.arg("--json"));
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn cli_responds_to_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_tl"))
        .arg("--help")
        .output()
        .expect("failed to execute tl --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("TrustLend") || stdout.contains("Usage"),
        "tl --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_tl"))
        .arg("--version")
        .output()
        .expect("failed to execute tl --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.1"), "unexpected version output: {stdout}");
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_tl"))
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute tl");

    assert!(!output.status.success());
}

#[test]
fn cli_requires_acting_user() {
    let home = tempfile::tempdir().unwrap();
    let output = tl(home.path())
        .args(["trust", "list"])
        .output()
        .expect("failed to execute tl");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--user"), "stderr: {stderr}");
}

#[test]
fn cli_negative_price_is_rejected_by_validation() {
    let home = tempfile::tempdir().unwrap();
    let output = tl(home.path())
        .args(["--user", "bob", "item", "publish", "--title", "Drill"])
        .args(["--lat", "-33.9", "--lng", "18.4", "--price", "-5"])
        .output()
        .expect("failed to execute tl");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("price per day must be a non-negative number"), "stderr: {stderr}");
}

#[test]
fn cli_trust_publish_and_book() {
    let home = tempfile::tempdir().unwrap();
    let h = home.path();

    run_ok(tl(h).args(["--user", "ann", "trust", "add", "bob"]));

    let level = json_out(tl(h).args(["--user", "ann", "trust", "level", "bob"]));
    assert_eq!(level["level"], 1);
    assert_eq!(level["label"], "direct");

    let item = json_out(tl(h).args([
        "--user", "bob", "item", "publish", "--title", "Drill", "--lat", "-33.9", "--lng",
        "18.4", "--price", "100",
    ]));
    let item_id = item["id"].as_str().unwrap().to_string();

    let visible = json_out(tl(h).args(["--user", "ann", "discover"]));
    assert_eq!(visible[0]["item"]["id"], item_id.as_str());
    assert_eq!(visible[0]["handshake_level"], 1);

    let booking = json_out(tl(h).args([
        "--user",
        "ann",
        "book",
        "request",
        item_id.as_str(),
        "--start",
        "2024-01-01",
        "--end",
        "2024-01-03",
    ]));
    let booking_id = booking["id"].as_str().unwrap().to_string();
    assert_eq!(booking["status"], "pending");

    let conflict = tl(h)
        .args([
            "--user",
            "cat",
            "book",
            "request",
            item_id.as_str(),
            "--start",
            "2024-01-03",
            "--end",
            "2024-01-05",
        ])
        .output()
        .unwrap();
    assert!(!conflict.status.success());
    assert!(String::from_utf8_lossy(&conflict.stderr).contains("overlaps"));

    let decided = json_out(tl(h).args(["--user", "bob", "book", "decide", booking_id.as_str(), "confirm"]));
    assert_eq!(decided["status"], "confirmed");

    let quote = json_out(tl(h).args(["book", "quote", booking_id.as_str()]));
    assert_eq!(quote["total"], 300.0);
    assert_eq!(quote["days"], 3);

    let blocked = json_out(tl(h).args(["item", "blocked", item_id.as_str()]));
    assert_eq!(blocked.as_array().unwrap().len(), 3);
}

#[test]
fn cli_config_save_writes_file() {
    let home = tempfile::tempdir().unwrap();
    run_ok(tl(home.path()).args(["config", "--save"]));
    assert!(home.path().join("config.json").exists());
}
