//! Integration tests for CLI output behavior
//!
//! stdout carries command output only; structured logs go to stderr.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Run dockbar with an isolated home directory and no explicit config.
fn run_dockbar(home: &Path, args: &[&str], config: Option<&Path>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_dockbar"));
    command
        .args(args)
        .env("HOME", home)
        .env_remove("DOCKBAR_CONFIG")
        .env_remove("RUST_LOG");
    if let Some(path) = config {
        command.env("DOCKBAR_CONFIG", path);
    }
    command.output().expect("Failed to execute dockbar")
}

fn parse_stdout(output: &Output) -> toml::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    toml::from_str(&stdout).unwrap_or_else(|e| panic!("stdout should be TOML ({e}): {stdout}"))
}

#[test]
fn test_config_prints_effective_defaults() {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_dockbar(home.path(), &["config"], None);

    assert!(
        output.status.success(),
        "dockbar config failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let config = parse_stdout(&output);
    assert_eq!(config["timing"]["scan_interval_ms"].as_integer(), Some(120));
    assert_eq!(config["timing"]["vanish_grace_ms"].as_integer(), Some(450));
    assert_eq!(config["taskbar"]["bar_height"].as_float(), Some(60.0));
    assert_eq!(config["edge_guard"]["enabled"].as_bool(), Some(true));
}

#[test]
fn test_logs_go_to_stderr_as_json() {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_dockbar(home.path(), &["config"], None);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        !stdout.contains("\"event\""),
        "stdout should not contain log events: {}",
        stdout
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        let value: serde_json::Value = serde_json::from_str(line)
            .unwrap_or_else(|e| panic!("stderr line should be JSON ({e}): {line}"));
        assert!(value.get("fields").is_some() || value.get("event").is_some());
    }
}

#[test]
fn test_quiet_suppresses_info_logs() {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_dockbar(home.path(), &["-q", "config"], None);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.trim().is_empty(),
        "quiet mode should not log: {}",
        stderr
    );
}

#[test]
fn test_explicit_config_file_applies() {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = home.path().join("dockbar.toml");
    fs::write(
        &config_path,
        "[timing]\nscan_interval_ms = 200\n\n[filter]\nexcluded_apps = [\"Music\"]\n",
    )
    .expect("Failed to write config");

    let output = run_dockbar(home.path(), &["-q", "config"], Some(&config_path));
    assert!(output.status.success());
    let config = parse_stdout(&output);
    assert_eq!(config["timing"]["scan_interval_ms"].as_integer(), Some(200));
    assert_eq!(config["timing"]["appear_grace_ms"].as_integer(), Some(150));
    assert_eq!(
        config["filter"]["excluded_apps"].as_array().map(|a| a.len()),
        Some(1)
    );
}

#[test]
fn test_user_config_in_home_applies() {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let config_dir = home.path().join(".dockbar");
    fs::create_dir_all(&config_dir).expect("Failed to create .dockbar dir");
    fs::write(config_dir.join("config.toml"), "[taskbar]\nbar_height = 44\n")
        .expect("Failed to write config");

    let output = run_dockbar(home.path(), &["-q", "config"], None);
    assert!(output.status.success());
    let config = parse_stdout(&output);
    assert_eq!(config["taskbar"]["bar_height"].as_float(), Some(44.0));
}

#[test]
fn test_invalid_config_warns_and_uses_defaults() {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = home.path().join("broken.toml");
    fs::write(&config_path, "invalid toml [[[").expect("Failed to write config");

    let output = run_dockbar(home.path(), &["-q", "config"], Some(&config_path));
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Warning: Could not load config"),
        "Expected warning in stderr, got: {}",
        stderr
    );
    let config = parse_stdout(&output);
    assert_eq!(config["timing"]["scan_interval_ms"].as_integer(), Some(120));
}

#[test]
fn test_rejected_value_warning_names_key() {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = home.path().join("zero.toml");
    fs::write(&config_path, "[timing]\nvanish_grace_ms = 0\n").expect("Failed to write config");

    let output = run_dockbar(home.path(), &["-q", "config"], Some(&config_path));
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("timing.vanish_grace_ms must be greater than 0"),
        "stderr: {}",
        stderr
    );
    assert!(stderr.contains("Fix the value named above"), "stderr: {}", stderr);
    let config = parse_stdout(&output);
    assert_eq!(config["timing"]["vanish_grace_ms"].as_integer(), Some(450));
}

#[cfg(not(target_os = "macos"))]
#[test]
fn test_list_fails_cleanly_off_macos() {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_dockbar(home.path(), &["-q", "list", "--json"], None);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Window access unavailable"), "stderr: {}", stderr);
}
