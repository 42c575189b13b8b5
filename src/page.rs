//! Split a page on `<h2>` headers and hand sections to their extractors.

use std::collections::BTreeMap;

use serde_json::json;

use crate::compatibility::{CompatDiv, CompatibilityExtractor};
use crate::data::{Data, Subject};
use crate::extractor::{Extractor, extract};
use crate::html::{Element, Interval, Node};
use crate::issues::{Issue, IssueKind};
use crate::specifications::{SpecRow, SpecificationExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Specifications,
    Compatibility,
    Other,
}

impl SectionKind {
    /// Classify a section by its header text.
    pub fn of(h2: &Element) -> Self {
        let title = h2.to_text().to_lowercase();
        match title.trim() {
            "specification" | "specifications" => SectionKind::Specifications,
            "browser compatibility"
            | "browser compatibilities"
            | "browser compatability"
            | "browser compatabilities" => SectionKind::Compatibility,
            _ => SectionKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    BeforeH2,
    InSection(SectionKind),
    /// After an `<h3>` in a compatibility section.
    SkippingH3,
}

/// Everything extracted from a page's sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageData {
    pub specs: Vec<SpecRow>,
    pub compat: Vec<CompatDiv>,
    pub footnotes: BTreeMap<String, String>,
    pub issues: Vec<Issue>,
    pub found_h2: bool,
    /// A specifications section explained why it has no table.
    pub why_no_spec: bool,
}

pub struct PageExtractor<'a> {
    data: &'a mut Data,
    subject: &'a Subject,
    section: Vec<Node>,
    kind: SectionKind,
    page: PageData,
}

impl<'a> PageExtractor<'a> {
    pub fn new(data: &'a mut Data, subject: &'a Subject) -> Self {
        Self {
            data,
            subject,
            section: Vec::new(),
            kind: SectionKind::Other,
            page: PageData::default(),
        }
    }

    /// Run the extractor for the collected section.
    fn flush(&mut self) {
        let nodes = std::mem::take(&mut self.section);
        if nodes.is_empty() {
            return;
        }
        match self.kind {
            SectionKind::Specifications => {
                log::debug!("Extracting specifications from {} nodes", nodes.len());
                let section = extract(SpecificationExtractor::new(self.data), &nodes);
                self.page.specs.extend(section.rows);
                self.page.issues.extend(section.issues);
                self.page.why_no_spec |= section.why_no_spec;
            }
            SectionKind::Compatibility => {
                log::debug!("Extracting compatibility from {} nodes", nodes.len());
                let extractor = CompatibilityExtractor::new(self.data, self.subject);
                let section = extract(extractor, &nodes);
                self.page.compat.extend(section.divs);
                self.page.footnotes.extend(section.footnotes);
                self.page.issues.extend(section.issues);
            }
            SectionKind::Other => {}
        }
    }
}

impl Extractor for PageExtractor<'_> {
    type State = State;
    type Output = PageData;

    fn initial_state(&self) -> State {
        State::BeforeH2
    }

    fn entering(&mut self, state: State, node: &Node) -> (State, bool) {
        let element = node.as_element();
        if let Some(h2) = element.filter(|e| e.level == Some(2)) {
            self.flush();
            self.page.found_h2 = true;
            self.kind = SectionKind::of(h2);
            if self.kind != SectionKind::Other {
                self.section.push(node.clone());
            }
            return (State::InSection(self.kind), false);
        }

        match state {
            State::InSection(SectionKind::Compatibility)
                if element.is_some_and(|e| e.level == Some(3)) =>
            {
                self.page.issues.push(Issue::at(
                    IssueKind::SkippedH3,
                    node.span(),
                    json!({"h3": node.to_text()}),
                ));
                self.flush();
                (State::SkippingH3, false)
            }
            State::InSection(SectionKind::Specifications | SectionKind::Compatibility) => {
                self.section.push(node.clone());
                (state, false)
            }
            State::BeforeH2 | State::InSection(SectionKind::Other) | State::SkippingH3 => {
                (state, false)
            }
        }
    }

    fn finalize(mut self, _state: State) -> PageData {
        self.flush();
        self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::html::{Scope, parse_fragment};

    fn h2(text: &str) -> Element {
        let fragment = parse_fragment(text, 0, Grammar::HTML, Scope::Page).unwrap();
        fragment.single_element().unwrap().clone()
    }

    #[test]
    fn test_section_kind() {
        let kinds: Vec<_> = [
            "<h2>Specifications</h2>",
            "<h2 id=\"Specification\">Specification</h2>",
            "<h2>Browser compatibility</h2>",
            "<h2>Browser Compatibility</h2>",
            "<h2>Browser compatibilities</h2>",
            "<h2>BROWSER COMPATABILITIES</h2>",
            "<h2>See also</h2>",
            "<h2>Specificationss</h2>",
        ]
        .iter()
        .map(|t| SectionKind::of(&h2(t)))
        .collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Specifications,
                SectionKind::Specifications,
                SectionKind::Compatibility,
                SectionKind::Compatibility,
                SectionKind::Compatibility,
                SectionKind::Compatibility,
                SectionKind::Other,
                SectionKind::Other,
            ]
        );
    }

    fn page(html: &str) -> PageData {
        let fragment = parse_fragment(html, 0, Grammar::KUMASCRIPT, Scope::Page).unwrap();
        let mut data = Data::default();
        let subject = Subject {
            id: 1,
            slug: "web-css-display".into(),
        };
        extract(PageExtractor::new(&mut data, &subject), &fragment.nodes)
    }

    #[test]
    fn test_other_sections_ignored() {
        let data = page(
            "<p>Intro</p><h2>Summary</h2><p>Text</p><h2>See also</h2><ul><li>x</li></ul>",
        );
        assert!(data.found_h2);
        assert!(data.issues.is_empty());
        assert!(data.specs.is_empty());
    }

    #[test]
    fn test_h3_in_compat_section() {
        let data = page(
            "<h2 id=\"Browser_compatibility\">Browser compatibility</h2>\
             <div>{{CompatibilityTable}}</div>\
             <h3 id=\"Notes\">Gecko notes</h3><p>Lost text.</p>\
             <h2>See also</h2>",
        );
        assert_eq!(data.issues.len(), 1);
        assert_eq!(data.issues[0].kind, IssueKind::SkippedH3);
        assert_eq!(data.issues[0].args["h3"], "Gecko notes");
        assert_eq!(data.issues[0].span().start, 90);
    }

    #[test]
    fn test_no_h2() {
        let data = page("<p>{{CompatibilityTable}}</p>");
        assert!(!data.found_h2);
    }
}
