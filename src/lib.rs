pub mod compatibility;
pub mod config;
pub mod data;
pub mod extractor;
pub mod grammar;
pub mod html;
pub mod issues;
pub mod kumascript;
pub mod page;
pub mod scrape;
pub mod specifications;
pub mod syntax;
pub mod utils;

pub use config::Config;
pub use config::ConfigBuilder;
pub use data::{Data, MemoryStore, Subject};
pub use grammar::{Grammar, ParseError};
pub use issues::{Issue, IssueKind, Severity};
pub use scrape::{ScrapeOptions, ScrapeResult, scrape_page};
pub use syntax::SyntaxNode;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scrapes a raw MDN page with the given configuration.
///
/// The resolution catalogue named by `config.data` is loaded first; without
/// one every browser, feature and version gets a placeholder id.
///
/// # Examples
///
/// ```rust
/// let page = "<h2>Specifications</h2>\n<table class=\"standard-table\">...</table>";
/// let result = kumascrape::scrape(page, None).unwrap();
/// println!("{}", serde_json::to_string_pretty(&result).unwrap());
/// ```
pub fn scrape(page: &str, config: Option<Config>) -> Result<ScrapeResult, data::DataError> {
    #[cfg(debug_assertions)]
    {
        init_logger();
    }

    let config = config.unwrap_or_default();
    let mut data = match &config.data {
        Some(path) => Data::new(MemoryStore::load(path)?),
        None => Data::default(),
    };
    Ok(scrape_page(page, &mut data, &config.scrape_options()))
}

/// Parses text with a grammar into a syntax tree.
///
/// # Examples
///
/// ```rust
/// use kumascrape::{Grammar, parse};
///
/// let tree = parse("<td>18 [1]</td>", Grammar::COMPAT_SUPPORT).unwrap();
/// println!("{:#?}", tree);
/// ```
pub fn parse(input: &str, grammar: Grammar) -> Result<SyntaxNode, ParseError> {
    grammar.parse(input)
}
