use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kumascrape")]
#[command(author, version)]
#[command(about = "Extracts specification and compatibility data from raw MDN pages")]
#[command(
    long_about = "Kumascrape reads the raw wiki source of an MDN page, including its embedded \
    KumaScript macros, and extracts the Specifications table and the Browser compatibility \
    tables with their footnotes. Everything unusual about the page is reported as an issue \
    pointing at the offending source text."
)]
#[command(after_help = "\
EXAMPLES:

    # Scrape a page to JSON
    kumascrape scrape page.html

    # Scrape from stdin
    cat page.html | kumascrape scrape

    # Show the issues found on a page
    kumascrape check page.html

    # Resolve names against a catalogue
    kumascrape scrape --data mdn.json page.html

    # Dump the syntax tree of a support cell
    echo '<td>18 [1]</td>' | kumascrape parse --grammar support

CONFIGURATION:

Kumascrape looks for configuration files in this order:
  1. Explicit --config path
  2. kumascrape.toml or .kumascrape.toml in current/parent directories
  3. ~/.config/kumascrape/config.toml (XDG)
  4. Built-in defaults

Example .kumascrape.toml:

    locale = \"en\"
    data = \"mdn.json\"
    min_severity = \"warning\"

    [feature]
    id = 1
    slug = \"web-css-display\"")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, global = true)]
    #[arg(help = "Path to configuration file")]
    #[arg(
        long_help = "Path to a custom configuration file. If not specified, kumascrape will \
        search for .kumascrape.toml or kumascrape.toml in the input's directory and its \
        parents, then fall back to ~/.config/kumascrape/config.toml."
    )]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// The whole result as JSON
    Json,
    /// Rendered issues
    Issues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GrammarName {
    Html,
    Kumascript,
    Feature,
    Support,
    Footnote,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape a page and print the extracted data
    #[command(
        long_about = "Scrape a raw MDN page and print the extracted specifications, \
        compatibility tables, footnotes and issues as JSON. Use --format issues to print \
        the rendered issues instead."
    )]
    #[command(after_help = "\
EXAMPLES:

    # Scrape to JSON
    kumascrape scrape page.html

    # Scrape a German page
    kumascrape scrape --locale de page.html

    # Print issues instead of data
    kumascrape scrape --format issues page.html")]
    Scrape {
        /// Input file (stdin if not provided)
        #[arg(help = "Input file path")]
        file: Option<PathBuf>,

        /// Locale of the page
        #[arg(long)]
        locale: Option<String>,

        /// JSON catalogue of known browsers, features and specifications
        #[arg(long, env = "KUMASCRAPE_DATA")]
        data: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
    /// Scrape a page and report its issues
    #[command(
        long_about = "Scrape a raw MDN page and print the issues found. Exits with code 1 \
        if any issue of error or critical severity was found, 0 otherwise."
    )]
    Check {
        /// Input file (stdin if not provided)
        #[arg(help = "Input file path")]
        file: Option<PathBuf>,
    },
    /// Parse and display the syntax tree for debugging
    #[command(
        long_about = "Parse text with one of the page grammars and print the concrete \
        syntax tree. Useful to see how a table cell or footnote is tokenized."
    )]
    Parse {
        /// Input file (stdin if not provided)
        #[arg(help = "Input file path")]
        file: Option<PathBuf>,

        /// Grammar to parse with
        #[arg(long, value_enum, default_value = "kumascript")]
        grammar: GrammarName,
    },
}
