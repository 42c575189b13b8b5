//! Scrape subcommand tests

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use crate::fixture;

fn scrape_json(args: &[&str]) -> serde_json::Value {
    let output = cargo_bin_cmd!("kumascrape")
        .arg("scrape")
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_scrape_with_catalogue() {
    let page = fixture("background-size.html");
    let data = fixture("catalogue.json");
    let json = scrape_json(&[
        "--data",
        data.to_str().unwrap(),
        page.to_str().unwrap(),
    ]);

    assert_eq!(json["locale"], "en");
    assert_eq!(json["issues"], serde_json::json!([]));
    assert_eq!(json["specs"][0]["specification.mdn_key"], "CSS3 Backgrounds");
    assert_eq!(json["specs"][0]["section.id"], 50);

    let div = &json["compat"][0];
    assert_eq!(div["name"], "desktop");
    assert_eq!(div["features"][1]["name"], "contain");
    assert_eq!(div["features"][1]["canonical"], true);

    let partial = div["supports"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["support"] == "partial")
        .unwrap();
    assert_eq!(partial["prefix"], "-webkit");
    assert_eq!(
        partial["footnote"],
        "Behind the <code>layout.css</code> preference."
    );
}

#[test]
fn test_scrape_stdin_without_catalogue() {
    let page = fs::read_to_string(fixture("background-size.html")).unwrap();
    cargo_bin_cmd!("kumascrape")
        .arg("scrape")
        .write_stdin(page)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unknown_browser\""))
        .stdout(predicate::str::contains("\"_Chrome for Desktop\""));
}

#[test]
fn test_scrape_locale() {
    cargo_bin_cmd!("kumascrape")
        .args(["scrape", "--locale", "de"])
        .write_stdin("<p>Kein Inhalt</p>")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"locale\": \"de\""));
}

#[test]
fn test_scrape_issues_format() {
    cargo_bin_cmd!("kumascrape")
        .args(["scrape", "--format", "issues"])
        .arg(fixture("broken-table.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("extra_cell"))
        .stdout(predicate::str::contains("broken-table.html"));
}

#[test]
fn test_scrape_uses_config_in_tree() {
    let temp_dir = TempDir::new().unwrap();
    let page = temp_dir.path().join("page.html");
    fs::copy(fixture("background-size.html"), &page).unwrap();
    fs::copy(fixture("catalogue.json"), temp_dir.path().join("mdn.json")).unwrap();
    fs::write(
        temp_dir.path().join(".kumascrape.toml"),
        "locale = \"fr\"\ndata = \"mdn.json\"\n\n[feature]\nid = 7\nslug = \"web-css-background-size\"\n",
    )
    .unwrap();

    let json = scrape_json(&[page.to_str().unwrap()]);
    assert_eq!(json["locale"], "fr");
    assert_eq!(json["issues"], serde_json::json!([]));
    assert_eq!(json["compat"][0]["features"][0]["id"], 7);
    assert_eq!(
        json["compat"][0]["features"][1]["slug"],
        "web-css-background-size_contain"
    );
}
