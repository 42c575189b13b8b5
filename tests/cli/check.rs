//! Check subcommand tests

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use crate::fixture;

#[test]
fn test_check_clean_page() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("kumascrape.toml");
    let data = fixture("catalogue.json");
    fs::write(&config, format!("data = {:?}\n", data.to_str().unwrap())).unwrap();

    cargo_bin_cmd!("kumascrape")
        .args(["check", "--config", config.to_str().unwrap()])
        .arg(fixture("background-size.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn test_check_errors_exit_nonzero() {
    cargo_bin_cmd!("kumascrape")
        .arg("check")
        .arg(fixture("broken-table.html"))
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("extra_cell"))
        .stdout(predicate::str::contains("feature_header"))
        .stdout(predicate::str::contains("Found 3 issue(s)"));
}

#[test]
fn test_check_plain_output() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("kumascrape.toml");
    fs::write(&config, "context = false\nmin_severity = \"error\"\n").unwrap();

    cargo_bin_cmd!("kumascrape")
        .args(["check", "--config", config.to_str().unwrap()])
        .arg(fixture("broken-table.html"))
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "extra_cell: Extra cell in compatibility table row. at 13:4",
        ))
        .stdout(predicate::str::contains("feature_header").not());
}

#[test]
fn test_check_section_without_table() {
    cargo_bin_cmd!("kumascrape")
        .arg("check")
        .write_stdin(
            "<h2>Browser compatibility</h2>\n<div>{{CompatibilityTable}}</div>\n\
             <h3>Notes</h3>\n<p>Later.</p>",
        )
        .assert()
        .failure()
        .stdout(predicate::str::contains("skipped_h3"))
        .stdout(predicate::str::contains("no_data"));
}
