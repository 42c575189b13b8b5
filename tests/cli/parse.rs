//! Parse subcommand tests

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

use crate::fixture;

#[test]
fn test_parse_stdin() {
    cargo_bin_cmd!("kumascrape")
        .arg("parse")
        .write_stdin("<p>Hello {{cssxref(\"color\")}}</p>")
        .assert()
        .success()
        .stdout(predicate::str::contains("ELEMENT"))
        .stdout(predicate::str::contains("MACRO"));
}

#[test]
fn test_parse_file() {
    cargo_bin_cmd!("kumascrape")
        .arg("parse")
        .arg(fixture("background-size.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("DOCUMENT"));
}

#[test]
fn test_parse_support_grammar() {
    cargo_bin_cmd!("kumascrape")
        .args(["parse", "--grammar", "support"])
        .write_stdin("<td>18 [1]</td>")
        .assert()
        .success()
        .stdout(predicate::str::contains("CELL_VERSION"))
        .stdout(predicate::str::contains("FOOTNOTE"));
}

#[test]
fn test_parse_html_grammar_rejects_macro_markup() {
    cargo_bin_cmd!("kumascrape")
        .args(["parse", "--grammar", "html"])
        .write_stdin("<p>This is <strong>bold</p></strong>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_parse_unknown_grammar() {
    cargo_bin_cmd!("kumascrape")
        .args(["parse", "--grammar", "yaml"])
        .write_stdin("<p></p>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
