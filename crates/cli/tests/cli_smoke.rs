//! CLI smoke tests for params.
//!
//! These tests verify that all CLI commands run without panicking, return
//! appropriate exit codes, and that separate processes sharing a store root
//! observe each other's writes.

use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the params binary bound to an isolated store root.
fn params_cmd(temp: &TempDir) -> Command {
  let mut cmd = cargo_bin_cmd!("params");
  cmd.env("PARAMS_ROOT", store_root(temp));
  cmd.env_remove("PARAMS_PERSISTENT_ROOT");
  cmd.env_remove("RUST_LOG");
  cmd
}

/// Spawn the params binary as a plain child process.
fn spawn_params(temp: &TempDir, args: &[&str]) -> std::process::Child {
  StdCommand::new(env!("CARGO_BIN_EXE_params"))
    .args(args)
    .env("PARAMS_ROOT", store_root(temp))
    .env_remove("RUST_LOG")
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .unwrap()
}

fn store_root(temp: &TempDir) -> std::path::PathBuf {
  temp.path().join("params")
}

fn key_file(temp: &TempDir, key: &str) -> std::path::PathBuf {
  store_root(temp).join("d").join(key)
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  cargo_bin_cmd!("params")
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  cargo_bin_cmd!("params")
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("params"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["get", "put", "get-bool", "put-bool", "remove", "dump", "info"] {
    cargo_bin_cmd!("params")
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// put / get / remove
// =============================================================================

#[test]
fn put_then_get() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp).args(["put", "IsMetric", "1"]).assert().success();

  params_cmd(&temp)
    .args(["get", "IsMetric"])
    .assert()
    .success()
    .stdout("1");
}

#[test]
fn put_from_stdin_keeps_bytes() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp)
    .args(["put", "Blob", "--stdin"])
    .write_stdin(vec![0u8, 1, 2, 255])
    .assert()
    .success();

  assert_eq!(std::fs::read(key_file(&temp, "Blob")).unwrap(), vec![0u8, 1, 2, 255]);
}

#[test]
fn get_missing_key_fails() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp)
    .args(["get", "Missing"])
    .assert()
    .failure()
    .stdout("")
    .stderr(predicate::str::contains("Key not found"));
}

#[test]
fn get_json_reports_null_for_missing() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp)
    .args(["--output", "json", "get", "Missing"])
    .assert()
    .failure()
    .stdout(predicate::str::contains("\"value\": null"));
}

#[test]
fn remove_then_get() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp).args(["put", "IsMetric", "1"]).assert().success();
  params_cmd(&temp)
    .args(["remove", "IsMetric"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed IsMetric"));
  params_cmd(&temp).args(["get", "IsMetric"]).assert().failure();
}

#[test]
fn remove_missing_key_reports_not_found() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp)
    .args(["remove", "Missing"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));

  params_cmd(&temp)
    .args(["--output", "json", "remove", "Missing"])
    .assert()
    .failure()
    .stdout(predicate::str::contains("-33"));
}

#[test]
fn invalid_key_is_rejected() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp)
    .args(["put", ".lock", "x"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid key"));
}

#[test]
fn bool_round_trip() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp).args(["get-bool", "Flag"]).assert().success().stdout("false\n");
  params_cmd(&temp).args(["put-bool", "Flag", "true"]).assert().success();
  params_cmd(&temp).args(["get-bool", "Flag"]).assert().success().stdout("true\n");
  params_cmd(&temp).args(["get", "Flag"]).assert().success().stdout("1");
}

// =============================================================================
// dump / info
// =============================================================================

#[test]
fn dump_lists_only_keys() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp).args(["put", "A", "1"]).assert().success();
  params_cmd(&temp).args(["put", "B", "2"]).assert().success();

  params_cmd(&temp)
    .arg("dump")
    .assert()
    .success()
    .stdout("A=1\nB=2\n");
}

#[test]
fn dump_json() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp).args(["put", "A", "1"]).assert().success();

  let output = params_cmd(&temp).args(["--output", "json", "dump"]).output().unwrap();
  assert!(output.status.success());
  let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(parsed, serde_json::json!({ "A": "1" }));
}

#[test]
fn info_shows_layout() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp)
    .arg("info")
    .assert()
    .success()
    .stdout(predicate::str::contains("Key directory"))
    .stdout(predicate::str::contains(".lock"));
}

#[test]
fn explicit_root_overrides_environment() {
  let temp = TempDir::new().unwrap();
  let other = temp.path().join("other");

  params_cmd(&temp)
    .arg("--root")
    .arg(&other)
    .args(["put", "Key", "v"])
    .assert()
    .success();

  assert!(other.join("d").join("Key").exists());
  assert!(!key_file(&temp, "Key").exists());
}

#[test]
fn unusable_root_fails() {
  let temp = TempDir::new().unwrap();
  let file = temp.path().join("not-a-dir");
  std::fs::write(&file, b"").unwrap();

  params_cmd(&temp)
    .arg("--root")
    .arg(&file)
    .args(["get", "Key"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to open params store"));
}

// =============================================================================
// Multi-process behaviour
// =============================================================================

#[test]
fn blocking_get_wakes_on_put_from_another_process() {
  let temp = TempDir::new().unwrap();
  // Create the store up front so the waiter does not race initialization.
  params_cmd(&temp).arg("info").assert().success();

  let waiter = spawn_params(&temp, &["get", "Later", "--block", "--timeout", "20s"]);
  std::thread::sleep(Duration::from_millis(500));

  let written = Instant::now();
  params_cmd(&temp).args(["put", "Later", "hello"]).assert().success();

  let output = waiter.wait_with_output().unwrap();
  assert!(output.status.success());
  assert_eq!(output.stdout, b"hello");
  assert!(written.elapsed() < Duration::from_secs(5));
}

#[test]
fn blocking_get_times_out() {
  let temp = TempDir::new().unwrap();

  params_cmd(&temp)
    .args(["get", "Never", "--block", "--timeout", "200ms"])
    .assert()
    .failure()
    .stdout("");
}

#[test]
#[cfg(unix)]
fn sigterm_cancels_blocking_get() {
  let temp = TempDir::new().unwrap();
  params_cmd(&temp).arg("info").assert().success();

  let waiter = spawn_params(&temp, &["get", "Never", "--block", "--timeout", "30s"]);
  std::thread::sleep(Duration::from_secs(1));

  let status = StdCommand::new("kill")
    .arg("-TERM")
    .arg(waiter.id().to_string())
    .status()
    .unwrap();
  assert!(status.success());

  let output = waiter.wait_with_output().unwrap();
  // Exits through the cancellation path rather than dying from the signal.
  assert_eq!(output.status.code(), Some(1));
  assert!(output.stdout.is_empty());
}

#[test]
fn concurrent_puts_from_processes_never_tear() {
  let temp = TempDir::new().unwrap();
  params_cmd(&temp).arg("info").assert().success();

  let values: Vec<String> = (0..6).map(|i| format!("{}", i).repeat(4096)).collect();
  let children: Vec<_> = values
    .iter()
    .map(|v| spawn_params(&temp, &["put", "Contended", v]))
    .collect();

  for child in children {
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
  }

  let stored = std::fs::read_to_string(key_file(&temp, "Contended")).unwrap();
  assert!(values.contains(&stored), "stored value is not one of the writes");
}

#[test]
fn concurrent_first_use_from_processes() {
  let temp = TempDir::new().unwrap();

  let children: Vec<_> = (0..4)
    .map(|i| spawn_params(&temp, &["put", &format!("Key{}", i), "v"]))
    .collect();
  for child in children {
    assert!(child.wait_with_output().unwrap().status.success());
  }

  let root = store_root(&temp);
  assert!(Path::new(&root.join("d")).is_dir());
  params_cmd(&temp)
    .arg("dump")
    .assert()
    .success()
    .stdout("Key0=v\nKey1=v\nKey2=v\nKey3=v\n");
}
