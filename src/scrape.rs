//! Whole-page scraping: parse, extract and package the result.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::compatibility::CompatDiv;
use crate::data::{Data, Subject};
use crate::extractor::extract;
use crate::grammar::Grammar;
use crate::html::{Node, Scope, Span, parse_fragment};
use crate::issues::{Issue, IssueKind, Severity};
use crate::kumascript::MacroKind;
use crate::page::PageExtractor;
use crate::specifications::SpecRow;
use crate::utils::end_of_line;

/// Text that must appear somewhere for a page to be worth parsing.
const DATA_MARKERS: &[&str] = &[
    "Browser compatibility</h",
    "Specifications</h",
    "CompatibilityTable",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub locale: String,
    /// The feature the page documents.
    pub subject: Subject,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            subject: Subject {
                id: 1,
                slug: "feature".to_string(),
            },
        }
    }
}

/// Everything scraped from one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapeResult {
    pub locale: String,
    pub specs: Vec<SpecRow>,
    pub compat: Vec<CompatDiv>,
    pub footnotes: BTreeMap<String, String>,
    pub issues: Vec<Issue>,
    pub embedded_compat: Vec<String>,
}

impl ScrapeResult {
    fn empty(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            ..Self::default()
        }
    }

    pub fn has_data(&self) -> bool {
        !self.specs.is_empty() || !self.compat.is_empty() || !self.embedded_compat.is_empty()
    }
}

/// Scrape the specification and compatibility data out of a raw page.
pub fn scrape_page(page: &str, data: &mut Data, options: &ScrapeOptions) -> ScrapeResult {
    let mut result = ScrapeResult::empty(&options.locale);
    if !DATA_MARKERS.iter().any(|marker| page.contains(marker)) {
        log::debug!("No data markers in page, skipping");
        return result;
    }

    let fragment = match parse_fragment(page, 0, Grammar::KUMASCRIPT, Scope::Page) {
        Ok(fragment) => fragment,
        Err(err) => {
            log::debug!("Page parse failed: {err}");
            let span = narrow_parse_error(page, err.pos);
            result
                .issues
                .push(Issue::at(IssueKind::HaltImport, span, json!({})));
            warn_critical(&result.issues);
            return result;
        }
    };
    result.issues = fragment.issues;
    result.embedded_compat = embedded_compat(&fragment.nodes);

    let page_data = extract(PageExtractor::new(data, &options.subject), &fragment.nodes);
    result.specs = page_data.specs;
    result.compat = page_data.compat;
    result.footnotes = page_data.footnotes;
    result.issues.extend(page_data.issues);

    if !page_data.found_h2 {
        result
            .issues
            .push(Issue::new(IssueKind::FalseStart, 0, 0, json!({})));
    } else if !result.has_data() && !page_data.why_no_spec {
        result
            .issues
            .push(Issue::new(IssueKind::NoData, 0, 0, json!({})));
    }

    warn_critical(&result.issues);
    result
}

fn warn_critical(issues: &[Issue]) {
    for issue in issues.iter().filter(|i| i.severity() == Severity::Critical) {
        log::warn!("{} at {}: {}", issue.slug(), issue.span(), issue.brief());
    }
}

/// Slugs of `{{EmbedCompatTable}}` calls anywhere on the page.
pub fn embedded_compat(nodes: &[Node]) -> Vec<String> {
    let mut slugs = Vec::new();
    for node in nodes {
        match node {
            Node::Macro(mac) => {
                if let MacroKind::EmbedCompatTable { slug } = mac.kind() {
                    slugs.push(slug.clone());
                }
            }
            Node::Element(element) => slugs.extend(embedded_compat(&element.children)),
            _ => {}
        }
    }
    slugs
}

/// Narrow a page parse failure at `pos` to the innermost tag pair that
/// fails to parse.
pub fn narrow_parse_error(page: &str, pos: usize) -> Span {
    narrow(page, 0, pos.min(page.len()))
}

fn narrow(text: &str, base: usize, pos: usize) -> Span {
    let fallback = Span::new(base + pos, base + end_of_line(text, pos));
    let Some(rest) = text.get(pos..) else {
        return fallback;
    };
    let Some(tag) = open_tag_name(rest) else {
        return fallback;
    };
    let Some(inner_start) = rest.find('>').map(|i| pos + i + 1) else {
        return fallback;
    };
    let Some(close_start) = find_close_tag(&text[inner_start..], tag).map(|i| inner_start + i)
    else {
        return fallback;
    };
    let close_end = text[close_start..]
        .find('>')
        .map_or(text.len(), |i| close_start + i + 1);

    let inner = &text[inner_start..close_start];
    match Grammar::KUMASCRIPT.parse(inner) {
        Ok(_) => Span::new(base + pos, base + close_end),
        Err(err) => {
            log::trace!("Narrowing into <{tag}> at {}", base + inner_start);
            narrow(inner, base + inner_start, err.pos)
        }
    }
}

/// Offset of the first `</tag>` in `text`, not matching longer tag names.
fn find_close_tag(text: &str, tag: &str) -> Option<usize> {
    let close = format!("</{tag}");
    text.match_indices(&close)
        .map(|(i, _)| i)
        .find(|&i| {
            text[i + close.len()..]
                .chars()
                .next()
                .is_none_or(|c| c == '>' || c.is_whitespace())
        })
}

fn open_tag_name(text: &str) -> Option<&str> {
    let name = text.strip_prefix('<')?;
    let len = name
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(name.len());
    (len > 0).then(|| &name[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_rejection() {
        let mut data = Data::default();
        let result = scrape_page("<p>Nothing here</p>", &mut data, &ScrapeOptions::default());
        assert_eq!(result, ScrapeResult::empty("en"));
    }

    #[test]
    fn test_narrow_to_unclosed_tag() {
        let page = "<p>This is <strong>bold</p></strong>";
        let err = Grammar::KUMASCRIPT.parse(page).unwrap_err();
        assert_eq!(narrow_parse_error(page, err.pos), Span::new(11, 23));
    }

    #[test]
    fn test_narrow_not_a_tag() {
        assert_eq!(narrow_parse_error("abc\ndef", 1), Span::new(1, 3));
    }

    #[test]
    fn test_narrow_whole_element() {
        // The inner content parses on its own.
        assert_eq!(
            narrow_parse_error("<div><p>x</p></div>\nmore", 0),
            Span::new(0, 19)
        );
    }

    #[test]
    fn test_close_tag_needs_full_name() {
        assert_eq!(find_close_tag("<pre>x</pre></p>", "p"), Some(12));
        assert_eq!(find_close_tag("x</p >", "p"), Some(1));
        assert_eq!(find_close_tag("<pre>x</pre>", "p"), None);
    }

    #[test]
    fn test_false_start() {
        let mut data = Data::default();
        let result = scrape_page(
            "<p>{{CompatibilityTable}}</p>",
            &mut data,
            &ScrapeOptions::default(),
        );
        let kinds: Vec<_> = result.issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::FalseStart]);
        assert_eq!(result.issues[0].span(), Span::new(0, 0));
    }

    #[test]
    fn test_no_data() {
        let mut data = Data::default();
        let result = scrape_page(
            "<h2>Specifications</h2>\n<p>See the standard.</p>",
            &mut data,
            &ScrapeOptions::default(),
        );
        let kinds: Vec<_> = result.issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::SkippedContent, IssueKind::NoData]);
    }

    #[test]
    fn test_why_no_spec_is_not_missing_data() {
        let mut data = Data::default();
        let result = scrape_page(
            "<h2 id=\"Specifications\">Specifications</h2>\n\
             <p>{{WhyNoSpecStart}}</p>\n\
             <p>Not part of any standard.</p>\n\
             <p>{{WhyNoSpecEnd}}</p>",
            &mut data,
            &ScrapeOptions::default(),
        );
        assert!(result.issues.is_empty(), "{:#?}", result.issues);
        assert!(result.specs.is_empty());
    }

    #[test]
    fn test_embedded_compat() {
        let mut data = Data::default();
        let result = scrape_page(
            "<h2>Browser compatibility</h2>\n<div>{{EmbedCompatTable(\"web-css-display\")}}</div>",
            &mut data,
            &ScrapeOptions::default(),
        );
        assert!(result.issues.is_empty());
        assert_eq!(result.embedded_compat, vec!["web-css-display"]);
    }
}
