//! CLI integration tests for kumascrape.
//!
//! These tests execute the compiled binary and verify CLI behavior including:
//! - Subcommand behavior (scrape, check, parse)
//! - Stdin/stdout handling
//! - Exit codes
//! - Config discovery

mod check;
mod common;
mod parse;
mod scrape;

use std::path::PathBuf;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
