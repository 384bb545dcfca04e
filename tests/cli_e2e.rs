//! End-to-end CLI tests for the wikiflow binary.

use assert_cmd::Command;
use predicates::prelude::*;

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("wikiflow").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download Wikipedia and Wikidata dumps"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("wikiflow").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wikiflow"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("wikiflow").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Dry run prints the graph as JSON and downloads nothing.
#[test]
fn test_binary_dry_run_prints_graph_json() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("wikiflow").unwrap();
    let output = cmd
        .args(["--dry-run", "-q", "-l", "en", "-l", "da", "--wikidata", "--chunk-size", "4096"])
        .arg("--corpora-dir")
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tasks = graph["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0]["name"], "en-wikipedia-download/url-download");
    assert_eq!(tasks[1]["params"]["shortname"], "dawiki");
    assert_eq!(tasks[2]["name"], "wikidata-download/url-download");
    assert_eq!(tasks[2]["params"]["chunksize"], 4096);
    assert_eq!(graph["resources"].as_array().unwrap().len(), 3);
    assert!(!temp_dir.path().join("wikipedia").exists());
}

/// Without languages the default language is used.
#[test]
fn test_binary_dry_run_defaults_to_english() {
    let mut cmd = Command::cargo_bin("wikiflow").unwrap();
    cmd.args(["--dry-run", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("enwiki-latest-pages-articles.xml.bz2"));
}
