use assert_cmd::Command;
use errp_rs::reader::{GdfWriter, MatBehaviorWriter, MatVariables};
use errp_rs::{Annotation, BehaviorRecord, Recording};
use ndarray::Array2;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn errp() -> Command {
    Command::cargo_bin("errp").unwrap()
}

/// 10 EEG channels and a trigger at 512 Hz, annotations at 10/20/30 s,
/// states [[0,1,2,1],[0,1,1,2]]
fn write_session(dir: &Path, stem: &str) -> (PathBuf, PathBuf) {
    let fs = 512.0;
    let data = Array2::from_shape_fn((11, 40 * 512), |(c, t)| {
        if c == 10 {
            0.0
        } else {
            1e-5 * (2.0 * std::f64::consts::PI * 5.0 * t as f64 / fs).sin()
        }
    });
    let mut names: Vec<String> = (1..=10).map(|i| format!("eeg:{}", i)).collect();
    names.push("trigger:1".to_string());
    let annotations = [10.0, 20.0, 30.0]
        .iter()
        .map(|&t| Annotation::new(t, "1"))
        .collect();
    let recording = Recording::new(data, names, fs)
        .unwrap()
        .with_annotations(annotations);
    let behavior =
        BehaviorRecord::from_rows(&[0, 1, 2, 1], &[0, 1, 1, 2], vec![1, 2, 3, 4, 5]).unwrap();

    let gdf = dir.join(format!("{}.gdf", stem));
    let mat = dir.join(format!("{}.mat", stem));
    GdfWriter::new().write(&gdf, &recording).unwrap();
    MatBehaviorWriter::new(MatVariables::default())
        .write(&mat, &behavior)
        .unwrap();
    (gdf, mat)
}

fn json_stdout(assert: assert_cmd::assert::Assert) -> serde_json::Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    errp()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    errp()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("errp"));
}

#[test]
fn test_help_flag() {
    errp()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("validate"));
}

// =============================================================================
// VALIDATE SUBCOMMAND
// =============================================================================

#[test]
fn test_validate_nonexistent_file() {
    errp()
        .args(["validate", "--file", "/nonexistent/run.gdf"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_validate_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello").unwrap();

    errp()
        .args(["validate", "--file", path.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unsupported"));
}

#[test]
fn test_validate_session_json() {
    let dir = TempDir::new().unwrap();
    let (gdf, mat) = write_session(dir.path(), "subject1");

    let parsed = json_stdout(
        errp()
            .args(["validate", "--file", gdf.to_str().unwrap(), "--json"])
            .assert()
            .success(),
    );
    assert_eq!(parsed["exists"], true);
    assert_eq!(parsed["supported"], true);
    assert_eq!(parsed["file_type"], "GDF");
    assert_eq!(parsed["companion"], mat.display().to_string());
    assert_eq!(parsed["companion_exists"], true);
    assert!(parsed["error"].is_null());
}

#[test]
fn test_validate_missing_companion() {
    let dir = TempDir::new().unwrap();
    let (gdf, mat) = write_session(dir.path(), "subject1");
    std::fs::remove_file(&mat).unwrap();

    errp()
        .args(["validate", "--file", gdf.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Companion file not found"));
}

// =============================================================================
// INFO SUBCOMMAND
// =============================================================================

#[test]
fn test_info_json() {
    let dir = TempDir::new().unwrap();
    let (_, mat) = write_session(dir.path(), "subject1");

    let parsed = json_stdout(
        errp()
            .args(["info", "--file", mat.to_str().unwrap(), "--json"])
            .assert()
            .success(),
    );
    let recording = &parsed["recording"];
    assert_eq!(recording["format"], "GDF");
    assert_eq!(recording["channels"].as_array().unwrap().len(), 11);
    assert_eq!(recording["sample_rate"], 512.0);
    assert_eq!(recording["num_samples"], 40 * 512);
    assert_eq!(recording["annotations"], 3);
    assert_eq!(parsed["behavior"]["state_columns"], 4);
    assert_eq!(parsed["behavior"]["actions"], 5);
}

#[test]
fn test_info_text() {
    let dir = TempDir::new().unwrap();
    let (gdf, _) = write_session(dir.path(), "subject1");

    errp()
        .args(["info", "--file", gdf.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("11 channels at 512 Hz"))
        .stdout(predicate::str::contains("State columns: 4, actions: 5"));
}

// =============================================================================
// EXTRACT SUBCOMMAND
// =============================================================================

#[test]
fn test_extract_summary() {
    let dir = TempDir::new().unwrap();
    let (gdf, _) = write_session(dir.path(), "subject1");

    let parsed = json_stdout(
        errp()
            .args(["extract", "--file", gdf.to_str().unwrap(), "--quiet"])
            .assert()
            .success(),
    );
    assert_eq!(parsed["sample_rate"], 512.0);
    assert_eq!(parsed["channels"].as_array().unwrap().len(), 10);
    assert_eq!(parsed["window_samples"], 768);
    assert_eq!(parsed["pre_samples"], 256);
    assert_eq!(parsed["band"], "theta");
    assert_eq!(parsed["car"], true);

    let alignment = &parsed["alignment"];
    assert_eq!(
        alignment["labels"],
        serde_json::json!(["no_error", "error", "error"])
    );
    assert_eq!(alignment["errors"], 2);
    assert_eq!(alignment["annotations"], 1);
    assert_eq!(alignment["paired"], 1);
    assert_eq!(alignment["consistent"], false);

    let classes = parsed["classes"].as_array().unwrap();
    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0]["label"], "error");
    assert_eq!(classes[0]["empty"], true);
    assert!(classes[0]["grand_average"].is_null());
    assert_eq!(classes[1]["label"], "no_error");
    assert_eq!(classes[1]["trials"], 1);
    assert_eq!(classes[1]["onsets"], serde_json::json!([20.0]));
    let average = classes[1]["grand_average"].as_array().unwrap();
    assert_eq!(average.len(), 10);
    assert_eq!(average[0].as_array().unwrap().len(), 768);
}

#[test]
fn test_extract_spectral_summary() {
    let dir = TempDir::new().unwrap();
    let (gdf, _) = write_session(dir.path(), "subject1");

    let parsed = json_stdout(
        errp()
            .args([
                "extract",
                "--file",
                gdf.to_str().unwrap(),
                "--band",
                "none",
                "--spectral",
                "--quiet",
            ])
            .assert()
            .success(),
    );
    assert!(parsed["band"].is_null());
    let spectral = &parsed["classes"][1]["spectral"];
    assert_eq!(spectral["frequencies"].as_array().unwrap().len(), 257);
    assert_eq!(spectral["times"].as_array().unwrap().len(), 6);
    assert_eq!(spectral["mean_magnitude"].as_array().unwrap().len(), 10);
}

#[test]
fn test_extract_strict_mismatch() {
    let dir = TempDir::new().unwrap();
    let (gdf, _) = write_session(dir.path(), "subject1");

    errp()
        .args(["extract", "--file", gdf.to_str().unwrap(), "--strict"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not match"));
}

#[test]
fn test_extract_missing_session() {
    errp()
        .args(["extract", "--file", "/nonexistent/run.gdf", "--quiet"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_extract_output_file_compact() {
    let dir = TempDir::new().unwrap();
    let (gdf, _) = write_session(dir.path(), "subject1");
    let out = dir.path().join("summary.json");

    errp()
        .args([
            "extract",
            "--file",
            gdf.to_str().unwrap(),
            "--compact",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Summary written to"));

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(!written.contains('\n'));
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed["classes"][1]["trials"], 1);
}

#[test]
fn test_extract_config_from_env() {
    let dir = TempDir::new().unwrap();
    let (gdf, _) = write_session(dir.path(), "subject1");
    let config = dir.path().join("pipeline.json");
    std::fs::write(&config, r#"{"pre": 0.25, "post": 0.5, "band": null, "car": false}"#).unwrap();

    let parsed = json_stdout(
        errp()
            .env("ERRP_CONFIG", config.to_str().unwrap())
            .args(["extract", "--file", gdf.to_str().unwrap(), "--quiet"])
            .assert()
            .success(),
    );
    assert_eq!(parsed["window_samples"], 384);
    assert_eq!(parsed["pre_samples"], 128);
    assert!(parsed["band"].is_null());
    assert_eq!(parsed["car"], false);
}

#[test]
fn test_extract_invalid_band() {
    errp()
        .args(["extract", "--file", "run.gdf", "--band", "gamma"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid band"));
}
