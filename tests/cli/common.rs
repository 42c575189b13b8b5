//! Cross-cutting CLI tests (help, version, error handling)

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help() {
    cargo_bin_cmd!("kumascrape")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kumascrape reads the raw wiki source"));
}

#[test]
fn test_version() {
    cargo_bin_cmd!("kumascrape")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_subcommand() {
    cargo_bin_cmd!("kumascrape")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    cargo_bin_cmd!("kumascrape")
        .arg("invalid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_scrape_help() {
    cargo_bin_cmd!("kumascrape")
        .args(["scrape", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scrape a raw MDN page"));
}

#[test]
fn test_missing_file() {
    cargo_bin_cmd!("kumascrape")
        .args(["scrape", "does-not-exist.html"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_config() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config = temp_dir.path().join("bad.toml");
    std::fs::write(&config, "output = \"yaml\"").unwrap();

    cargo_bin_cmd!("kumascrape")
        .args(["scrape", "--config", config.to_str().unwrap()])
        .write_stdin("<h2>Specifications</h2>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}
