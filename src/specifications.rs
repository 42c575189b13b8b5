//! The "Specifications" section.
//!
//! The section is an `<h2>` followed by a three-column table: the
//! specification name (`{{SpecName}}`), its maturity (`{{Spec2}}`) and a
//! free-form description. Each data row becomes a [`SpecRow`].

use serde::Serialize;
use serde_json::json;

use crate::data::{Data, Specification};
use crate::extractor::Extractor;
use crate::grammar::Grammar;
use crate::html::{Element, Interval, Node, Scope, Span, reparse_element};
use crate::issues::{Issue, IssueKind};
use crate::kumascript::{Macro, MacroKind};
use crate::utils::join_content;

/// Specification names written as text on older pages.
const LEGACY_SPEC_NAMES: &[(&str, &str)] = &[
    ("ECMAScript 1st Edition.", "ES1"),
    ("ECMAScript 3rd Edition.", "ES3"),
];

const HEADER_IDS: &[&str] = &["Specifications", "Specification"];

/// One row of the specifications table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecRow {
    #[serde(rename = "specification.mdn_key")]
    pub mdn_key: String,
    #[serde(rename = "specification.id")]
    pub specification_id: Option<u64>,
    #[serde(rename = "section.subpath")]
    pub subpath: String,
    #[serde(rename = "section.name")]
    pub section_name: String,
    #[serde(rename = "section.note")]
    pub note: String,
    #[serde(rename = "section.id")]
    pub section_id: Option<u64>,
}

/// What the name column resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecName {
    pub key: Option<String>,
    pub subpath: String,
    pub section_name: String,
    pub specification: Option<Specification>,
}

/// What the maturity column held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Maturity {
    Key(String),
    Text { text: String, span: Span },
    Missing,
}

fn reparse(td: &Element, scope: Scope, issues: &mut Vec<Issue>) -> Option<Element> {
    match reparse_element(td, Grammar::KUMASCRIPT, scope) {
        Ok((element, found)) => {
            issues.extend(found);
            Some(element)
        }
        Err(err) => {
            log::debug!("Unable to reparse {} cell: {}", scope, err);
            issues.push(Issue::new(
                IssueKind::HaltImport,
                err.pos,
                td.span.end.max(err.pos),
                json!({}),
            ));
            None
        }
    }
}

/// A `{{WhyNoSpecStart}}...{{WhyNoSpecEnd}}` block, bare or wrapped in a
/// `<p>` or `<div>` of its own.
fn is_why_no_spec(node: &Node) -> bool {
    match node {
        Node::Macro(mac) => matches!(mac.kind(), MacroKind::WhyNoSpec { .. }),
        Node::Element(element) if matches!(element.tag.as_str(), "div" | "p") => {
            let mut content = element.children.iter().filter(|n| !n.is_blank()).peekable();
            content.peek().is_some() && content.all(is_why_no_spec)
        }
        _ => false,
    }
}

fn macros(element: &Element) -> impl Iterator<Item = &Macro> {
    element.children.iter().filter_map(Node::as_macro)
}

/// Span from the first to the last non-blank child, else the whole cell.
fn content_span(element: &Element) -> Span {
    let mut content = element.children.iter().filter(|n| !n.is_blank());
    match (content.next(), content.last()) {
        (Some(first), Some(last)) => first.span().cover(last.span()),
        (Some(only), None) => only.span(),
        _ => element.span,
    }
}

fn lookup_spec(
    data: &mut Data,
    key: &str,
    span: Span,
    issues: &mut Vec<Issue>,
) -> Option<Specification> {
    let spec = data.lookup_specification(key);
    if spec.is_none() {
        issues.push(Issue::at(IssueKind::UnknownSpec, span, json!({"key": key})));
    }
    spec
}

/// Read the specification name column.
pub fn read_name_cell(td: &Element, data: &mut Data, issues: &mut Vec<Issue>) -> SpecName {
    let Some(td) = reparse(td, Scope::SpecificationName, issues) else {
        return SpecName::default();
    };

    let spec_name = macros(&td).find_map(|m| match m.kind() {
        MacroKind::SpecName {
            key,
            subpath,
            section_name,
        } => Some((m, key, subpath, section_name)),
        _ => None,
    });
    if let Some((mac, key, subpath, section_name)) = spec_name {
        let specification = if key.is_empty() {
            issues.push(mac.issue(IssueKind::SpecnameBlankKey, json!({})));
            None
        } else {
            lookup_spec(data, key, mac.span(), issues)
        };
        return SpecName {
            key: Some(key.clone()),
            subpath: subpath.clone(),
            section_name: section_name.clone(),
            specification,
        };
    }

    let text = td.to_text();
    if text.is_empty() {
        if macros(&td).next().is_none() {
            issues.push(Issue::at(IssueKind::SpecnameOmitted, td.span, json!({})));
        }
        return SpecName::default();
    }

    let span = content_span(&td);
    let Some((_, key)) = LEGACY_SPEC_NAMES.iter().find(|(name, _)| *name == text) else {
        issues.push(Issue::at(
            IssueKind::SpecnameNotKumascript,
            span,
            json!({"original": text}),
        ));
        return SpecName::default();
    };
    issues.push(Issue::at(
        IssueKind::SpecnameConverted,
        span,
        json!({"original": text, "key": key}),
    ));
    SpecName {
        key: Some(key.to_string()),
        specification: lookup_spec(data, key, span, issues),
        ..SpecName::default()
    }
}

/// Read the maturity column.
pub fn read_maturity_cell(td: &Element, issues: &mut Vec<Issue>) -> Maturity {
    let Some(td) = reparse(td, Scope::SpecificationMaturity, issues) else {
        return Maturity::Missing;
    };

    if let Some(mac) = macros(&td).next() {
        return match mac.kind() {
            MacroKind::Spec2 { key } => Maturity::Key(key.clone()),
            _ => {
                issues.push(mac.issue(IssueKind::Spec2WrongKumascript, json!({})));
                Maturity::Missing
            }
        };
    }

    let text = td.to_text();
    if text.is_empty() {
        issues.push(Issue::at(IssueKind::Spec2Omitted, td.span, json!({})));
        return Maturity::Missing;
    }
    Maturity::Text {
        text,
        span: content_span(&td),
    }
}

/// Read the description column as rendered HTML.
pub fn read_description_cell(td: &Element, issues: &mut Vec<Issue>) -> String {
    let Some(td) = reparse(td, Scope::SpecificationDescription, issues) else {
        return String::new();
    };
    for mac in macros(&td) {
        if matches!(mac.kind(), MacroKind::Spec2 { .. }) {
            issues.push(mac.issue(IssueKind::SpecdescSpec2Invalid, json!({})));
        }
    }
    join_content(td.children.iter().map(Node::to_html))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Maturity,
    Description,
    Extra,
}

impl Column {
    fn next(self) -> Column {
        match self {
            Column::Name => Column::Maturity,
            Column::Maturity => Column::Description,
            Column::Description | Column::Extra => Column::Extra,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Begin,
    ExtractedHeader,
    InTable,
    InFirstRow,
    InTableData,
    InDataRow(Column),
    ExtractedTable,
}

#[derive(Debug, Default)]
struct RowBuilder {
    span: Span,
    name: SpecName,
    maturity: Option<Maturity>,
    note: String,
}

/// Rows and issues of a specifications section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecSection {
    pub rows: Vec<SpecRow>,
    pub issues: Vec<Issue>,
    /// The section explains why there is no specification.
    pub why_no_spec: bool,
}

pub struct SpecificationExtractor<'d> {
    data: &'d mut Data,
    rows: Vec<SpecRow>,
    issues: Vec<Issue>,
    row: Option<RowBuilder>,
    why_no_spec: bool,
}

impl<'d> SpecificationExtractor<'d> {
    pub fn new(data: &'d mut Data) -> Self {
        Self {
            data,
            rows: Vec::new(),
            issues: Vec::new(),
            row: None,
            why_no_spec: false,
        }
    }

    fn check_header(&mut self, h2: &Element) {
        if let Some(id) = h2.open.attributes.get("id")
            && !HEADER_IDS.contains(&id.value_str())
        {
            self.issues.push(Issue::at(
                IssueKind::SpecH2Id,
                id.span,
                json!({"h2_id": id.value_str()}),
            ));
        }
        if let Some(name) = h2.open.attributes.get("name")
            && !HEADER_IDS.contains(&name.value_str())
        {
            self.issues.push(Issue::at(
                IssueKind::SpecH2Name,
                name.span,
                json!({"h2_name": name.value_str()}),
            ));
        }
    }

    fn skipped(&mut self, node: &Node) {
        self.issues
            .push(Issue::at(IssueKind::SkippedContent, node.span(), json!({})));
    }

    fn read_cell(&mut self, column: Column, cell: &Element) {
        let Some(row) = self.row.as_mut() else {
            unreachable!("cell outside of a row");
        };
        match column {
            Column::Name => row.name = read_name_cell(cell, self.data, &mut self.issues),
            Column::Maturity => row.maturity = Some(read_maturity_cell(cell, &mut self.issues)),
            Column::Description => row.note = read_description_cell(cell, &mut self.issues),
            Column::Extra => self
                .issues
                .push(Issue::at(IssueKind::SkippedContent, cell.span, json!({}))),
        }
    }

    fn finish_row(&mut self) {
        let Some(row) = self.row.take() else {
            return;
        };
        let Some(key) = row.name.key else {
            return;
        };

        match row.maturity {
            Some(Maturity::Key(spec2_key)) if !spec2_key.is_empty() && spec2_key != key => {
                self.issues.push(Issue::at(
                    IssueKind::SpecMismatch,
                    row.span,
                    json!({"spec2_key": spec2_key, "specname_key": key}),
                ));
            }
            Some(Maturity::Text { text, span }) => {
                self.issues.push(Issue::at(
                    IssueKind::Spec2Converted,
                    span,
                    json!({"key": key, "original": text}),
                ));
            }
            _ => {}
        }

        let specification_id = row.name.specification.as_ref().map(|s| s.id);
        let section_id = specification_id
            .and_then(|id| self.data.lookup_section(id, &row.name.subpath))
            .map(|s| s.id);
        self.rows.push(SpecRow {
            mdn_key: key,
            specification_id,
            subpath: row.name.subpath,
            section_name: row.name.section_name,
            note: row.note,
            section_id,
        });
    }
}

impl Extractor for SpecificationExtractor<'_> {
    type State = State;
    type Output = SpecSection;

    fn initial_state(&self) -> State {
        State::Begin
    }

    fn entering(&mut self, state: State, node: &Node) -> (State, bool) {
        match state {
            State::Begin => {
                let Some(h2) = node.as_element().filter(|e| e.level == Some(2)) else {
                    unreachable!("specification section must start with <h2>");
                };
                self.check_header(h2);
                (State::ExtractedHeader, false)
            }
            State::ExtractedHeader | State::ExtractedTable => {
                if node.is_blank() {
                    return (state, false);
                }
                if is_why_no_spec(node) {
                    self.why_no_spec = true;
                    return (state, false);
                }
                if state == State::ExtractedHeader && node.tag() == Some("table") {
                    return (State::InTable, true);
                }
                self.skipped(node);
                (state, false)
            }
            State::InTable | State::InTableData => match node.tag() {
                Some("thead" | "tbody") => (state, true),
                Some("tr") => {
                    let row = node.as_element().map(|e| e.elements().any(|c| c.tag == "th"));
                    if state == State::InTable && row == Some(true) {
                        return (State::InFirstRow, false);
                    }
                    self.row = Some(RowBuilder {
                        span: node.span(),
                        ..RowBuilder::default()
                    });
                    (State::InDataRow(Column::Name), true)
                }
                _ if node.is_blank() => (state, false),
                _ => {
                    self.skipped(node);
                    (state, false)
                }
            },
            State::InDataRow(column) => match node.as_element() {
                Some(cell) if matches!(cell.tag.as_str(), "td" | "th") => {
                    self.read_cell(column, cell);
                    (State::InDataRow(column.next()), false)
                }
                _ if node.is_blank() => (state, false),
                _ => {
                    self.skipped(node);
                    (state, false)
                }
            },
            State::InFirstRow => unreachable!("header row children are not visited"),
        }
    }

    fn leaving(&mut self, state: State, node: &Node) -> State {
        match (state, node.tag()) {
            (State::InFirstRow, Some("tr")) => State::InTableData,
            (State::InDataRow(_), Some("tr")) => {
                self.finish_row();
                State::InTableData
            }
            (State::InTable | State::InTableData, Some("table")) => State::ExtractedTable,
            _ => state,
        }
    }

    fn finalize(mut self, _state: State) -> SpecSection {
        self.finish_row();
        log::debug!("Extracted {} specification rows", self.rows.len());
        SpecSection {
            rows: self.rows,
            issues: self.issues,
            why_no_spec: self.why_no_spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryStore;
    use crate::extractor::extract;
    use crate::html::parse_fragment;

    fn data() -> Data {
        Data::new(
            MemoryStore::from_json(
                r##"{
                    "specifications": [
                        {"id": 1, "mdn_key": "CSS3 UI", "name": "CSS Basic User Interface Module Level 3"},
                        {"id": 2, "mdn_key": "ES1", "name": "ECMAScript 1st Edition"}
                    ],
                    "sections": [{"id": 7, "specification": 1, "subpath": "#cursor"}]
                }"##,
            )
            .unwrap(),
        )
    }

    fn td(text: &str) -> Element {
        let fragment = parse_fragment(text, 0, Grammar::KUMASCRIPT, Scope::Page).unwrap();
        fragment.single_element().unwrap().clone()
    }

    fn slugs(issues: &[Issue]) -> Vec<&'static str> {
        issues.iter().map(|i| i.slug()).collect()
    }

    #[test]
    fn test_name_cell_specname() {
        let mut issues = Vec::new();
        let name = read_name_cell(
            &td(r#"<td>{{SpecName('CSS3 UI', '#cursor', 'cursor')}}</td>"#),
            &mut data(),
            &mut issues,
        );
        assert!(issues.is_empty());
        assert_eq!(name.key.as_deref(), Some("CSS3 UI"));
        assert_eq!(name.subpath, "#cursor");
        assert_eq!(name.section_name, "cursor");
        assert_eq!(name.specification.map(|s| s.id), Some(1));
    }

    #[test]
    fn test_name_cell_unknown_spec() {
        let mut issues = Vec::new();
        read_name_cell(&td("<td>{{SpecName('CSS3 Nope')}}</td>"), &mut data(), &mut issues);
        assert_eq!(slugs(&issues), vec!["unknown_spec"]);
        assert_eq!(issues[0].span(), Span::new(4, 29));
    }

    #[test]
    fn test_name_cell_blank_key() {
        let mut issues = Vec::new();
        read_name_cell(&td("<td>{{SpecName('', '#x')}}</td>"), &mut data(), &mut issues);
        assert_eq!(slugs(&issues), vec!["specname_blank_key"]);
    }

    #[test]
    fn test_name_cell_text() {
        let mut issues = Vec::new();
        let name = read_name_cell(&td("<td>No spec</td>"), &mut data(), &mut issues);
        assert!(name.key.is_none());
        assert_eq!(slugs(&issues), vec!["specname_not_kumascript"]);
        assert_eq!(issues[0].span(), Span::new(4, 11));
        assert_eq!(issues[0].args["original"], "No spec");
    }

    #[test]
    fn test_name_cell_legacy() {
        let mut issues = Vec::new();
        let name = read_name_cell(
            &td("<td> ECMAScript 3rd Edition. </td>"),
            &mut data(),
            &mut issues,
        );
        assert_eq!(name.key.as_deref(), Some("ES3"));
        assert_eq!(slugs(&issues), vec!["specname_converted", "unknown_spec"]);
        assert_eq!(issues[0].span(), Span::new(4, 29));
        assert_eq!(issues[0].args["key"], "ES3");

        let mut issues = Vec::new();
        let name = read_name_cell(
            &td("<td>ECMAScript 1st Edition.</td>"),
            &mut data(),
            &mut issues,
        );
        assert_eq!(name.specification.map(|s| s.id), Some(2));
        assert_eq!(slugs(&issues), vec!["specname_converted"]);
    }

    #[test]
    fn test_maturity_cell() {
        let mut issues = Vec::new();
        assert_eq!(
            read_maturity_cell(&td("<td>{{Spec2('CSS3 UI')}}</td>"), &mut issues),
            Maturity::Key("CSS3 UI".into())
        );
        assert!(issues.is_empty());

        let m = read_maturity_cell(&td("<td>Standard</td>"), &mut issues);
        assert!(matches!(m, Maturity::Text { ref text, .. } if text == "Standard"));
        assert!(issues.is_empty());

        read_maturity_cell(&td("<td>{{SpecName('CSS3 UI')}}</td>"), &mut issues);
        assert_eq!(slugs(&issues), vec!["spec2_wrong_kumascript"]);
    }

    #[test]
    fn test_maturity_cell_wrong_args() {
        let mut issues = Vec::new();
        let m = read_maturity_cell(&td("<td>{{Spec2()}}</td>"), &mut issues);
        assert_eq!(m, Maturity::Key(String::new()));
        assert_eq!(slugs(&issues), vec!["kumascript_wrong_args"]);
        assert_eq!(issues[0].span(), Span::new(4, 15));
    }

    #[test]
    fn test_description_cell() {
        let mut issues = Vec::new();
        let note = read_description_cell(
            &td("<td>Defines {{experimental_inline}} the <code>cursor</code> value.</td>"),
            &mut issues,
        );
        assert!(issues.is_empty());
        assert_eq!(note, "Defines the <code>cursor</code> value.");
    }

    #[test]
    fn test_description_cell_spec2() {
        let mut issues = Vec::new();
        let note = read_description_cell(
            &td("<td>Same as {{Spec2('HTML5 W3C')}}</td>"),
            &mut issues,
        );
        assert_eq!(slugs(&issues), vec!["specdesc_spec2_invalid"]);
        assert_eq!(issues[0].span(), Span::new(12, 34));
        assert_eq!(note, "Same as specification HTML5 W3C");
    }

    fn section(html: &str) -> SpecSection {
        let fragment = parse_fragment(html, 0, Grammar::KUMASCRIPT, Scope::Page).unwrap();
        let mut data = data();
        extract(SpecificationExtractor::new(&mut data), &fragment.nodes)
    }

    #[test]
    fn test_section_rows() {
        let section = section(
            r#"<h2 id="Specifications">Specifications</h2>
<table class="standard-table">
 <thead>
  <tr><th>Specification</th><th>Status</th><th>Comment</th></tr>
 </thead>
 <tbody>
  <tr>
   <td>{{SpecName('CSS3 UI', '#cursor', 'cursor')}}</td>
   <td>{{Spec2('CSS3 UI')}}</td>
   <td>Addition of keywords.</td>
  </tr>
 </tbody>
</table>"#,
        );
        assert_eq!(section.issues, vec![]);
        assert_eq!(
            section.rows,
            vec![SpecRow {
                mdn_key: "CSS3 UI".into(),
                specification_id: Some(1),
                subpath: "#cursor".into(),
                section_name: "cursor".into(),
                note: "Addition of keywords.".into(),
                section_id: Some(7),
            }]
        );
    }

    #[test]
    fn test_section_mismatch_and_converted() {
        let section = section(
            "<h2 id=\"Specs\">Specifications</h2>\
             <table><tr><th>Specification</th><th>Status</th><th>Comment</th></tr>\
             <tr><td>{{SpecName('CSS3 UI')}}</td><td>{{Spec2('CSS2')}}</td><td></td></tr>\
             <tr><td>{{SpecName('CSS3 UI')}}</td><td>Standard</td><td></td></tr></table>",
        );
        assert_eq!(
            slugs(&section.issues),
            vec!["spec_h2_id", "spec_mismatch", "spec2_converted"]
        );
        assert_eq!(section.issues[0].args["h2_id"], "Specs");
        assert_eq!(section.rows.len(), 2);
    }

    #[test]
    fn test_section_skipped_content() {
        let section = section(
            "<h2 id=\"Specifications\">Specifications</h2>\
             <p>Not part of any specification.</p>\
             {{WhyNoSpecStart}}Not a spec.{{WhyNoSpecEnd}}",
        );
        assert_eq!(slugs(&section.issues), vec!["skipped_content"]);
        assert_eq!(section.issues[0].span(), Span::new(43, 80));
        assert!(section.rows.is_empty());
    }

    #[test]
    fn test_section_why_no_spec_in_paragraphs() {
        let wrapped = section(
            "<h2 id=\"Specifications\">Specifications</h2>\n\
             <p>{{WhyNoSpecStart}}</p>\n\
             <p>Not part of any standard.</p>\n\
             <p>{{WhyNoSpecEnd}}</p>",
        );
        assert_eq!(wrapped.issues, vec![]);
        assert!(wrapped.rows.is_empty());
        assert!(wrapped.why_no_spec);

        let mixed = section(
            "<h2 id=\"Specifications\">Specifications</h2>\
             <div><p>{{WhyNoSpecStart}}Removed.{{WhyNoSpecEnd}}</p></div>\
             <p>Not part of any standard.</p>",
        );
        assert_eq!(slugs(&mixed.issues), vec!["skipped_content"]);
        assert!(mixed.why_no_spec);
    }
}
