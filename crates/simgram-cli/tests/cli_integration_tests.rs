//! CLI Integration Tests
//!
//! Tests for `simgram` commands using `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get the CLI binary command
#[allow(deprecated)]
fn simgram_cmd() -> Command {
    let mut cmd = Command::cargo_bin("simgram").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("SIMGRAM_CONFIG");
    cmd
}

fn build_names(dir: &TempDir) -> std::path::PathBuf {
    let db_path = dir.path().join("names.db");
    simgram_cmd()
        .arg("build")
        .arg(&db_path)
        .arg("--no-pad")
        .write_stdin("Barack Hussein Obama II\nJames Gordon Brown\n")
        .assert()
        .success();
    db_path
}

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
}

// =============================================================================
// Help & Version Tests
// =============================================================================

#[test]
fn test_help_displays_usage() {
    simgram_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("SimGram CLI"))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_displays_version() {
    simgram_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("simgram"));
}

#[test]
fn test_invalid_command_shows_error() {
    simgram_cmd()
        .arg("invalid_command_xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// =============================================================================
// Build Command Tests
// =============================================================================

#[test]
fn test_build_from_stdin_prints_summary() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("db");

    simgram_cmd()
        .arg("build")
        .arg(&db_path)
        .write_stdin("one\ntwo\nthree\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted 3 strings"));

    assert!(db_path.join("simgram.json").exists());
    assert!(!db_path.join("LOCK").exists());
}

#[test]
fn test_build_from_input_file_quietly() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("names.txt");
    write_file(&input, "alpha\nbeta\n");

    simgram_cmd()
        .arg("build")
        .arg(temp_dir.path().join("db"))
        .arg("--input")
        .arg(&input)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_build_with_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();

    simgram_cmd()
        .arg("build")
        .arg(temp_dir.path().join("db"))
        .arg("--input")
        .arg(temp_dir.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.txt"));
}

#[test]
fn test_build_rejects_conflicting_options_on_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = build_names(&temp_dir);

    simgram_cmd()
        .arg("build")
        .arg(&db_path)
        .write_stdin("Gordon Brown\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pad"));
}

// =============================================================================
// Query Command Tests
// =============================================================================

#[test]
fn test_query_names_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = build_names(&temp_dir);

    simgram_cmd()
        .arg("query")
        .arg(&db_path)
        .arg("Barack Obama")
        .args(["-s", "cosine", "-t", "0.6"])
        .assert()
        .success()
        .stdout("Barack Hussein Obama II\n");

    simgram_cmd()
        .arg("query")
        .arg(&db_path)
        .arg("Obama")
        .args(["-s", "overlap", "-t", "1.0"])
        .assert()
        .success()
        .stdout("Barack Hussein Obama II\n");
}

#[test]
fn test_query_from_stdin_with_echo() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = build_names(&temp_dir);

    simgram_cmd()
        .arg("query")
        .arg(&db_path)
        .args(["--echo", "-t", "0.6"])
        .write_stdin("Gordon Brown\nObama\n")
        .assert()
        .success()
        .stdout("Gordon Brown\n\tJames Gordon Brown\nObama\n");
}

#[test]
fn test_query_json_format() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = build_names(&temp_dir);

    let output = simgram_cmd()
        .arg("query")
        .arg(&db_path)
        .arg("Gordon Brown")
        .args(["-t", "0.6", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["query"], "Gordon Brown");
    assert_eq!(value["matches"][0]["text"], "James Gordon Brown");
    assert_eq!(value["matches"][0]["id"], 1);
}

#[test]
fn test_query_benchmark_prints_counts() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = build_names(&temp_dir);

    simgram_cmd()
        .arg("query")
        .arg(&db_path)
        .arg("Gordon Brown")
        .args(["-t", "0.6", "--benchmark"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1 strings retrieved ("));
}

#[test]
fn test_query_rejects_invalid_threshold() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = build_names(&temp_dir);

    simgram_cmd()
        .arg("query")
        .arg(&db_path)
        .arg("Obama")
        .args(["-t", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("threshold"));
}

#[test]
fn test_query_missing_database_fails() {
    let temp_dir = TempDir::new().unwrap();

    simgram_cmd()
        .arg("query")
        .arg(temp_dir.path().join("nope"))
        .arg("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_query_uses_config_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = build_names(&temp_dir);
    let config = temp_dir.path().join("simgram.toml");
    write_file(&config, "[search]\nmeasure = \"overlap\"\nthreshold = 1.0\n");

    simgram_cmd()
        .arg("--config")
        .arg(&config)
        .arg("query")
        .arg(&db_path)
        .arg("Obama")
        .assert()
        .success()
        .stdout("Barack Hussein Obama II\n");
}

#[test]
fn test_invalid_config_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = build_names(&temp_dir);
    let config = temp_dir.path().join("simgram.toml");
    write_file(&config, "[logging]\nlevel = \"loud\"\n");

    simgram_cmd()
        .arg("--config")
        .arg(&config)
        .arg("info")
        .arg(&db_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("logging.level"));
}

// =============================================================================
// Info Command Tests
// =============================================================================

#[test]
fn test_info_shows_stats() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = build_names(&temp_dir);

    simgram_cmd()
        .arg("info")
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Strings:          2"))
        .stdout(predicate::str::contains("Padding:          false"));
}

#[test]
fn test_info_json() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = build_names(&temp_dir);

    let output = simgram_cmd()
        .arg("info")
        .arg(&db_path)
        .args(["--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["string_count"], 2);
    assert_eq!(value["ngram_size"], 3);
    assert_eq!(value["bucket_count"], 2);
}

#[test]
fn test_build_failure_keeps_lines_before_it() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("db");
    let input = temp_dir.path().join("broken.txt");
    fs::write(&input, b"alpha\nbeta\n\xff\xfe\ngamma\n").unwrap();

    simgram_cmd()
        .arg("build")
        .arg(&db_path)
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 3"))
        .stderr(predicate::str::contains("2 lines inserted before it"));

    simgram_cmd()
        .arg("info")
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Strings:          2"));
}
