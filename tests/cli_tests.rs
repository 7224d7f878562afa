//! CLI binary tests: exit codes and console output

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_csv(dir: &Path, name: &str) {
    fs::write(
        dir.join(name),
        "time,v1,v2,v3,v4,v5,current\n0,0,0,0,0,0,1\n1e-9,0,0,0,0,0,2\n2e-9,0,0,0,0,0,3\n",
    )
    .unwrap();
}

/// `data/run1` with a PC and a Diode file, `data/empty` with none
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let run = dir.path().join("data").join("run1");
    fs::create_dir_all(&run).unwrap();
    fs::create_dir_all(dir.path().join("data").join("empty")).unwrap();
    write_csv(&run, "PC_voltage5_lifetime0.001_ehpdensity0.0001_time.csv");
    write_csv(&run, "Diode_voltage5_lifetime0.001_ehpdensity0.0001_time.csv");
    dir
}

fn chargesheet() -> Command {
    Command::cargo_bin("chargesheet").unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    chargesheet()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("COMMANDS"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn test_cli_version() {
    chargesheet()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chargesheet"));
}

#[test]
fn test_export_help() {
    chargesheet()
        .args(["export", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--baseline"))
        .stdout(predicate::str::contains("--exclude-trailing-rows"));
}

// ═══════════════════════════════════════════════════════════════════════════
// LS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_ls_lists_experiments_with_csv_files() {
    let dir = data_dir();
    chargesheet()
        .arg("ls")
        .arg(dir.path().join("data"))
        .assert()
        .success()
        .stdout(predicate::str::contains("run1"))
        .stdout(predicate::str::contains("empty").not());
}

#[test]
fn test_ls_without_experiments_fails() {
    let dir = data_dir();
    chargesheet()
        .arg("ls")
        .arg(dir.path().join("data").join("empty"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No experiments"));
}

#[test]
fn test_ls_uses_configured_data_dir() {
    let dir = data_dir();
    let config = dir.path().join("chargesheet.yaml");
    fs::write(&config, format!("data_dir: {:?}\n", dir.path().join("data"))).unwrap();

    chargesheet()
        .arg("ls")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("run1"));
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_by_path() {
    let dir = data_dir();
    let output = dir.path().join("charge.xlsx");

    chargesheet()
        .arg("export")
        .arg(dir.path().join("data").join("run1"))
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Export Complete"));

    assert!(output.exists());
}

#[test]
fn test_export_by_name_under_data_dir() {
    let dir = data_dir();
    let config = dir.path().join("chargesheet.yaml");
    let output = dir.path().join("named.xlsx");
    fs::write(
        &config,
        format!(
            "data_dir: {:?}\noutput: {:?}\n",
            dir.path().join("data"),
            output
        ),
    )
    .unwrap();

    chargesheet()
        .args(["export", "run1", "--config"])
        .arg(&config)
        .assert()
        .success();

    assert!(output.exists());
}

#[test]
fn test_export_unknown_experiment_fails() {
    let dir = data_dir();
    chargesheet()
        .current_dir(dir.path())
        .args(["export", "no-such-run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_export_missing_baseline_fails_without_output() {
    let dir = data_dir();
    let output = dir.path().join("charge.xlsx");

    chargesheet()
        .arg("export")
        .arg(dir.path().join("data").join("run1"))
        .arg("-o")
        .arg(&output)
        .args(["--baseline", "Laser"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("baseline device \"Laser\""));

    assert!(!output.exists());
}

#[test]
fn test_invalid_config_fails() {
    let dir = data_dir();
    let config = dir.path().join("bad.yaml");
    fs::write(&config, "charts: [not, a, map]\n").unwrap();

    chargesheet()
        .arg("export")
        .arg(dir.path().join("data").join("run1"))
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config parsing error"));
}
