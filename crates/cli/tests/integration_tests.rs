//! Integration tests for cuectl
//!
//! No iCUE installation is assumed: every test either needs no SDK or runs
//! against a configuration whose search finds nothing.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Custom predicate to check if output is valid JSON
fn is_json() -> impl predicates::Predicate<[u8]> {
    predicates::function::function(|s: &[u8]| {
        std::str::from_utf8(s).is_ok_and(|text| serde_json::from_str::<Value>(text).is_ok())
    })
}

/// A cuectl command isolated from the caller's environment.
fn cuectl() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("cuectl")?;
    cmd.env_remove("CUEBRIDGE_SDK_PATH")
        .env_remove("CUEBRIDGE_CONFIG")
        .env_remove("CUEBRIDGE_EVENT_CAPACITY")
        .env_remove("CUEBRIDGE_POLL_BATCH")
        .env_remove("RUST_LOG");
    Ok(cmd)
}

/// Config that searches only an empty directory.
fn empty_search_config(dir: &TempDir) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.path().join("cuebridge.yaml");
    let text = format!(
        "resolver:\n  search_module_dir: false\n  extra_dirs: [{}]\n  install_dirs: []\n  \
         relative_dirs: []\n  search_default_path: false\n",
        serde_json::to_string(&dir.path().join("sdk"))?
    );
    std::fs::write(&path, text)?;
    Ok(path)
}

fn missing_sdk(dir: &TempDir) -> PathBuf {
    dir.path().join("nowhere").join("libiCUESDK.so")
}

fn json_stdout(output: &[u8]) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::from_slice(output)?)
}

fn arg(path: &Path) -> &std::ffi::OsStr {
    path.as_os_str()
}

// --- Help and metadata ---

#[test]
fn test_cli_help() -> TestResult {
    cuectl()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("iCUE SDK"));
    Ok(())
}

#[test]
fn test_cli_version() -> TestResult {
    cuectl()?
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cuectl"));
    Ok(())
}

#[test]
fn test_subcommand_help_lists_options() -> TestResult {
    cuectl()?
        .args(["color", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--exclusive"))
        .stdout(predicate::str::contains("--timeout-ms"));
    Ok(())
}

// --- Commands that need no SDK ---

#[test]
fn test_keys_human() -> TestResult {
    cuectl()?
        .arg("keys")
        .assert()
        .success()
        .stdout(predicate::str::contains("G12"))
        .stdout(predicate::str::contains("0x00010001"));
    Ok(())
}

#[test]
fn test_keys_json() -> TestResult {
    let assert = cuectl()?.args(["keys", "--json"]).assert().success();
    let value = json_stdout(&assert.get_output().stdout)?;
    assert_eq!(value["success"], true);
    assert_eq!(value["macroKeys"].as_array().map(Vec::len), Some(12));
    assert_eq!(value["leds"][0]["name"], "G1");
    assert_eq!(value["leds"][12]["luid"], "0x00000001");
    Ok(())
}

// --- SDK not available ---

#[test]
fn test_probe_reports_attempts_when_sdk_missing() -> TestResult {
    let dir = TempDir::new()?;
    let config = empty_search_config(&dir)?;
    let sdk = missing_sdk(&dir);

    let assert = cuectl()?
        .args(["probe", "--json", "--config"])
        .arg(arg(&config))
        .arg("--sdk-path")
        .arg(arg(&sdk))
        .assert()
        .code(3)
        .stdout(is_json());

    let value = json_stdout(&assert.get_output().stdout)?;
    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["type"], "sdk_unavailable");
    let attempts = value["error"]["attempts"]
        .as_array()
        .ok_or("attempts missing")?;
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["path"], sdk.display().to_string());
    Ok(())
}

#[test]
fn test_probe_human_lists_search_order() -> TestResult {
    let dir = TempDir::new()?;
    let config = empty_search_config(&dir)?;

    cuectl()?
        .arg("probe")
        .arg("--config")
        .arg(arg(&config))
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Search order:"))
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Tried:"));
    Ok(())
}

#[test]
fn test_devices_without_sdk() -> TestResult {
    let dir = TempDir::new()?;
    let config = empty_search_config(&dir)?;

    cuectl()?
        .args(["devices", "--all", "--config"])
        .arg(arg(&config))
        .assert()
        .code(3);
    Ok(())
}

#[test]
fn test_sdk_path_from_environment() -> TestResult {
    let dir = TempDir::new()?;
    let config = empty_search_config(&dir)?;
    let sdk = missing_sdk(&dir);

    let assert = cuectl()?
        .env("CUEBRIDGE_SDK_PATH", &sdk)
        .args(["probe", "--json", "--config"])
        .arg(arg(&config))
        .assert()
        .code(3);
    let value = json_stdout(&assert.get_output().stdout)?;
    assert_eq!(value["error"]["attempts"][0]["path"], sdk.display().to_string());
    Ok(())
}

// --- Invalid input ---

#[test]
fn test_color_unknown_key_fails_before_loading() -> TestResult {
    let dir = TempDir::new()?;
    let config = empty_search_config(&dir)?;

    let assert = cuectl()?
        .args(["color", "Z9", "255", "0", "0", "--json", "--config"])
        .arg(arg(&config))
        .assert()
        .code(4);
    let value = json_stdout(&assert.get_output().stdout)?;
    assert_eq!(value["error"]["type"], "validation");
    assert!(
        value["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("Z9"))
    );
    Ok(())
}

#[test]
fn test_invalid_config_file() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "events:\n  capacity: 0\n")?;

    cuectl()?
        .arg("probe")
        .arg("--config")
        .arg(arg(&path))
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Error:"));
    Ok(())
}

#[test]
fn test_devices_rejects_zero_capacity() -> TestResult {
    cuectl()?
        .args(["devices", "--capacity", "0"])
        .assert()
        .code(4);
    Ok(())
}

#[test]
fn test_missing_config_file() -> TestResult {
    let dir = TempDir::new()?;
    cuectl()?
        .arg("probe")
        .arg("--config")
        .arg(arg(&dir.path().join("absent.yaml")))
        .assert()
        .code(1);
    Ok(())
}
