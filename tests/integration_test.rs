//! Integration tests for the replknet-config CLI.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run replknet-config and return (stdout, stderr, exit_code).
fn run(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_replknet-config"))
        .args(args)
        .output()
        .expect("Failed to spawn replknet-config");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn write_cfg(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_show_prints_defaults_as_yaml() {
    let (stdout, _stderr, exit_code) = run(&["show"]);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("BATCH_SIZE: 64"), "{stdout}");
    assert!(stdout.contains("TYPE: RepLKNet"), "{stdout}");
    assert!(stdout.contains("SEED: 42"), "{stdout}");
}

#[test]
fn test_show_json_output() {
    let (stdout, _stderr, exit_code) = run(&["show", "--json"]);

    assert_eq!(exit_code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["DATA"]["BATCH_SIZE"], 64);
    assert_eq!(value["TRAIN"]["OPTIMIZER"]["NAME"], "AdamW");
}

#[test]
fn test_show_applies_file_and_cli_tiers() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "base.yaml", "TRAIN:\n  NUM_EPOCHS: 30\n");
    let leaf = write_cfg(
        &dir,
        "finetune.yaml",
        "BASE: ['base.yaml']\nDATA:\n  IMAGE_SIZE: 384\n",
    );

    let (stdout, _stderr, exit_code) =
        run(&["show", "--cfg", &leaf, "--batch-size", "32", "--batch-size-eval", "16"]);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("NUM_EPOCHS: 30"), "{stdout}");
    assert!(stdout.contains("IMAGE_SIZE: 384"), "{stdout}");
    assert!(stdout.contains("BATCH_SIZE: 32"), "{stdout}");
    assert!(stdout.contains("BATCH_SIZE_EVAL: 16"), "{stdout}");
}

#[test]
fn test_check_accepts_valid_config() {
    let dir = TempDir::new().unwrap();
    let path = write_cfg(&dir, "ok.yaml", "SEED: 7\n");

    let (_stdout, stderr, exit_code) = run(&["check", "--cfg", &path]);

    assert_eq!(exit_code, 0);
    assert!(stderr.contains("Configuration is valid."), "{stderr}");
}

#[test]
fn test_check_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let path = write_cfg(&dir, "typo.yaml", "DATA:\n  BATCH_SIZEE: 128\n");

    let (_stdout, stderr, exit_code) = run(&["check", "--cfg", &path]);

    assert_ne!(exit_code, 0);
    assert!(stderr.contains("does not match the schema"), "{stderr}");
}

#[test]
fn test_check_rejects_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.yaml");

    let (_stdout, stderr, exit_code) = run(&["check", "--cfg", path.to_str().unwrap()]);

    assert_ne!(exit_code, 0);
    assert!(stderr.contains("Failed to read config file"), "{stderr}");
}

#[test]
fn test_check_rejects_base_cycle() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "a.yaml", "BASE: ['b.yaml']\n");
    let b = write_cfg(&dir, "b.yaml", "BASE: ['a.yaml']\n");

    let (_stdout, stderr, exit_code) = run(&["check", "--cfg", &b]);

    assert_ne!(exit_code, 0);
    assert!(stderr.contains("Circular BASE reference"), "{stderr}");
}

#[test]
fn test_init_then_show_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");

    let (_stdout, stderr, exit_code) = run(&["init", "--path", path.to_str().unwrap()]);
    assert_eq!(exit_code, 0);
    assert!(stderr.contains("Configuration file created"), "{stderr}");
    assert!(Path::new(&path).exists());

    let (stdout, _stderr, exit_code) = run(&["show", "--cfg", path.to_str().unwrap()]);
    assert_eq!(exit_code, 0);
    assert!(stdout.contains("NAME: replknet_31b"), "{stdout}");
}

#[test]
fn test_quiet_suppresses_check_output() {
    let (_stdout, stderr, exit_code) = run(&["check", "-q"]);

    assert_eq!(exit_code, 0);
    assert!(!stderr.contains("Configuration is valid."), "{stderr}");
}

#[test]
fn test_version_output() {
    let (stdout, _stderr, exit_code) = run(&["version"]);

    assert_eq!(exit_code, 0);
    assert!(stdout.starts_with("replknet-config "), "{stdout}");
}
