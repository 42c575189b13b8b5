//! The "Browser compatibility" section.
//!
//! The section holds one or more `<div id="compat-NAME">` blocks, each
//! wrapping a table. The header row names the browsers after a "Feature"
//! label. In data rows the first cell is a feature and the others are
//! support cells; `rowspan` and `colspan` are laid out on a [`Grid`].
//! Paragraphs after the tables are footnotes, matched back to support
//! entries by id once the walk is done.

mod feature;
mod footnotes;
mod grid;
mod support;

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::json;

use crate::data::{BrowserLookup, Data, Id, Subject};
use crate::extractor::Extractor;
use crate::html::{AttributeActions, Element, Interval, Node, Span};
use crate::issues::{Issue, IssueKind};
use crate::kumascript::MacroKind;

pub use feature::read_feature_cell;
pub use footnotes::{FootnoteBody, FootnoteReader};
pub use grid::{Grid, PlaceError};
pub use support::{SupportEntry, read_support_cell};

/// Largest `colspan` HTML allows on a header cell.
const MAX_HEADER_COLSPAN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportLevel {
    Yes,
    No,
    Partial,
}

/// A footnote reference: id, start and end of the marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FootnoteRef(pub String, pub usize, pub usize);

impl FootnoteRef {
    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn span(&self) -> Span {
        Span::new(self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatBrowser {
    pub id: Id,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatVersion {
    pub id: Id,
    pub browser: Id,
    pub version: String,
}

fn is_false(value: &bool) -> bool {
    !value
}

fn is_true(value: &bool) -> bool {
    *value
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatFeature {
    pub id: Id,
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing_if = "is_false")]
    pub canonical: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub experimental: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub obsolete: bool,
    #[serde(skip_serializing_if = "is_true")]
    pub standardized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatSupport {
    pub id: Id,
    pub support: SupportLevel,
    pub version: Id,
    pub feature: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footnote_id: Option<FootnoteRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footnote: Option<String>,
}

/// One compatibility table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompatDiv {
    pub name: String,
    pub browsers: Vec<CompatBrowser>,
    pub versions: Vec<CompatVersion>,
    pub features: Vec<CompatFeature>,
    pub supports: Vec<CompatSupport>,
}

/// Tables, unused footnotes and issues of a compatibility section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompatSection {
    pub divs: Vec<CompatDiv>,
    /// Footnotes no support refers to, by id.
    pub footnotes: BTreeMap<String, String>,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Begin,
    BeforeCompatDiv,
    CompatDiv,
    InTable,
    InHeaderRow,
    InBrowserNames,
    ExtractedRow,
    InDataRow,
    AfterCompatDiv,
    InFootnotes,
}

#[derive(Debug)]
enum Cell {
    Feature(Option<CompatFeature>),
    Support(Vec<SupportEntry>),
}

/// The table being read.
#[derive(Debug, Default)]
struct TableBuilder {
    name: String,
    browsers: Vec<BrowserLookup>,
    /// Browser index per column; column 0 holds features.
    columns: Vec<Option<usize>>,
    rows: usize,
    row: usize,
    grid: Option<Grid>,
    cells: Vec<Cell>,
}

/// Number of `<tr>` rows in a table, looking through `<thead>` and
/// `<tbody>`.
fn count_rows(element: &Element) -> usize {
    element
        .elements()
        .map(|e| match e.tag.as_str() {
            "tr" => 1,
            "thead" | "tbody" => count_rows(e),
            _ => 0,
        })
        .sum()
}

/// Span of the non-blank content of `element`, else the element itself.
fn content_span(element: &Element) -> Span {
    element
        .children
        .iter()
        .filter(|n| !n.is_blank())
        .map(Interval::span)
        .reduce(Span::cover)
        .unwrap_or(element.span)
}

/// `{{CompatibilityTable}}` or `{{EmbedCompatTable}}`, bare or alone in a
/// `<div>` or `<p>`.
fn is_table_marker(node: &Node) -> bool {
    match node {
        Node::Macro(mac) => matches!(
            mac.kind(),
            MacroKind::CompatibilityTable | MacroKind::EmbedCompatTable { .. }
        ),
        Node::Element(element) if matches!(element.tag.as_str(), "div" | "p") => {
            let mut content = element.children.iter().filter(|n| !n.is_blank()).peekable();
            content.peek().is_some() && content.all(is_table_marker)
        }
        _ => false,
    }
}

/// The name of a compat div, from an id like `compat-desktop`.
fn compat_div_name(node: &Node) -> Option<&str> {
    let div = node.as_element().filter(|e| e.tag == "div")?;
    let (prefix, name) = div.attr("id")?.split_once('-')?;
    (prefix == "compat").then_some(name)
}

pub struct CompatibilityExtractor<'a> {
    data: &'a mut Data,
    subject: &'a Subject,
    divs: Vec<CompatDiv>,
    table: Option<TableBuilder>,
    /// Span of the compat div being read.
    div: Option<Span>,
    footnotes: FootnoteReader,
    reported_versions: HashSet<(Id, String)>,
    issues: Vec<Issue>,
}

impl<'a> CompatibilityExtractor<'a> {
    pub fn new(data: &'a mut Data, subject: &'a Subject) -> Self {
        Self {
            data,
            subject,
            divs: Vec::new(),
            table: None,
            div: None,
            footnotes: FootnoteReader::new(),
            reported_versions: HashSet::new(),
            issues: Vec::new(),
        }
    }

    fn table(&mut self) -> &mut TableBuilder {
        self.table
            .as_mut()
            .unwrap_or_else(|| unreachable!("table state without a compat div"))
    }

    fn skipped(&mut self, node: &Node) {
        self.issues
            .push(Issue::at(IssueKind::SkippedContent, node.span(), json!({})));
    }

    /// Content between the header and the compat divs, or between divs.
    fn outside_div(&mut self, state: State, node: &Node) -> (State, bool) {
        if node.is_blank() || is_table_marker(node) {
            return (state, false);
        }
        if let Some(name) = compat_div_name(node) {
            log::debug!("Reading compat div {name:?}");
            self.table = Some(TableBuilder {
                name: name.to_string(),
                ..TableBuilder::default()
            });
            self.div = Some(node.span());
            return (State::CompatDiv, true);
        }
        if state == State::BeforeCompatDiv {
            self.skipped(node);
            return (state, false);
        }
        self.footnotes.push(node);
        (State::InFootnotes, false)
    }

    fn read_feature_header(&mut self, th: &Element) {
        let header = th.to_text();
        if header != "Feature" {
            self.issues.push(Issue::at(
                IssueKind::FeatureHeader,
                content_span(th),
                json!({"header": header}),
            ));
        }
    }

    fn read_browser_header(&mut self, th: &Element) {
        let (attributes, found) = AttributeActions::table_header().validate(&th.open);
        self.issues.extend(found);

        let name = th.to_text();
        let lookup = self.data.lookup_browser(&name);
        if lookup.browser.is_none() {
            self.issues.push(Issue::at(
                IssueKind::UnknownBrowser,
                content_span(th),
                json!({"name": name}),
            ));
        }
        let mut colspan = attributes
            .value("colspan")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1);
        if colspan > MAX_HEADER_COLSPAN {
            self.issues
                .push(Issue::at(IssueKind::CellOutOfBounds, th.span, json!({})));
            colspan = MAX_HEADER_COLSPAN;
        }

        let table = self.table();
        let index = table.browsers.len();
        table.browsers.push(lookup);
        table.columns.extend(std::iter::repeat_n(Some(index), colspan));
    }

    fn start_grid(&mut self) {
        let table = self.table();
        table.columns.insert(0, None);
        table.grid = Some(Grid::new(table.rows, table.columns.len()));
    }

    fn read_cell(&mut self, td: &Element) {
        let table = self
            .table
            .as_mut()
            .unwrap_or_else(|| unreachable!("cell outside of a compat div"));
        let Some(grid) = table.grid.as_mut() else {
            unreachable!("data row before the header row");
        };
        let index = table.cells.len();
        let row = table.row;
        let (rowspan, colspan) = (td.span_attr("rowspan"), td.span_attr("colspan"));
        let col = match grid.place(row, index, rowspan, colspan) {
            Ok(col) => col,
            Err(PlaceError::RowFull) => {
                self.issues
                    .push(Issue::at(IssueKind::ExtraCell, td.span, json!({})));
                return;
            }
            Err(err @ PlaceError::OutOfBounds { .. }) => {
                log::debug!("Cell {} in row {row}: {err}", td.span);
                self.issues
                    .push(Issue::at(IssueKind::CellOutOfBounds, td.span, json!({})));
                match grid.column_of(row, index) {
                    Some(col) => col,
                    None => return,
                }
            }
        };

        let cell = if col == 0 {
            Cell::Feature(read_feature_cell(td, self.subject, self.data, &mut self.issues))
        } else {
            Cell::Support(read_support_cell(td, &mut self.issues))
        };
        self.table().cells.push(cell);
    }

    /// Resolve versions and supports row by row and store the div.
    fn finish_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        let mut div = CompatDiv {
            name: table.name,
            browsers: table
                .browsers
                .iter()
                .map(|b| CompatBrowser {
                    id: b.id.clone(),
                    name: b.name.clone(),
                    slug: b.slug.clone(),
                })
                .collect(),
            ..CompatDiv::default()
        };

        let mut seen_features = HashSet::new();
        for cell in &table.cells {
            if let Cell::Feature(Some(feature)) = cell
                && seen_features.insert(feature.id.clone())
            {
                div.features.push(feature.clone());
            }
        }

        let Some(grid) = table.grid else {
            self.divs.push(div);
            return;
        };
        let mut seen_versions = HashSet::new();
        let mut seen_supports = HashSet::new();
        for row in 0..grid.rows() {
            let feature = match grid.get(row, 0).map(|i| &table.cells[i]) {
                Some(Cell::Feature(Some(feature))) => feature.id.clone(),
                _ => continue,
            };
            let mut seen_cells = HashSet::new();
            for col in 1..grid.cols() {
                let (Some(index), Some(browser)) = (grid.get(row, col), table.columns[col]) else {
                    continue;
                };
                if !seen_cells.insert((index, browser)) {
                    continue;
                }
                let Cell::Support(entries) = &table.cells[index] else {
                    continue;
                };
                let browser = &table.browsers[browser];
                for entry in entries {
                    let version = self.data.lookup_version(browser, &entry.version);
                    if version.id.is_new()
                        && !browser.id.is_new()
                        && self
                            .reported_versions
                            .insert((browser.id.clone(), entry.version.clone()))
                    {
                        self.issues.push(Issue::at(
                            IssueKind::UnknownVersion,
                            entry.span,
                            json!({
                                "version": entry.version,
                                "browser_name": browser.name,
                                "browser_id": browser.id,
                                "browser_slug": browser.slug,
                            }),
                        ));
                    }
                    let support = self.data.lookup_support(&version.id, &feature);
                    if seen_versions.insert(version.id.clone()) {
                        div.versions.push(CompatVersion {
                            id: version.id.clone(),
                            browser: browser.id.clone(),
                            version: entry.version.clone(),
                        });
                    }
                    if seen_supports.insert(support.clone()) {
                        div.supports.push(CompatSupport {
                            id: support,
                            support: entry.support,
                            version: version.id,
                            feature: feature.clone(),
                            prefix: entry.prefix.clone(),
                            footnote_id: entry.footnote.clone(),
                            footnote: None,
                        });
                    }
                }
            }
        }
        log::debug!(
            "Compat div {:?}: {} features, {} supports",
            div.name,
            div.features.len(),
            div.supports.len()
        );
        self.divs.push(div);
    }
}

impl Extractor for CompatibilityExtractor<'_> {
    type State = State;
    type Output = CompatSection;

    fn initial_state(&self) -> State {
        State::Begin
    }

    fn entering(&mut self, state: State, node: &Node) -> (State, bool) {
        match state {
            State::Begin => {
                if node.as_element().and_then(|e| e.level) != Some(2) {
                    unreachable!("compatibility section must start with <h2>");
                }
                (State::BeforeCompatDiv, false)
            }
            State::BeforeCompatDiv | State::AfterCompatDiv => self.outside_div(state, node),
            State::InFootnotes => {
                self.footnotes.push(node);
                (state, false)
            }
            State::CompatDiv => match node.as_element() {
                Some(table) if table.tag == "table" && self.table.is_some() => {
                    let rows = count_rows(table).saturating_sub(1);
                    self.table().rows = rows;
                    (State::InTable, true)
                }
                _ if node.is_blank() => (state, false),
                _ => {
                    self.skipped(node);
                    (state, false)
                }
            },
            State::InTable | State::ExtractedRow => match node.tag() {
                Some("thead" | "tbody") => (state, true),
                Some("tr") if state == State::InTable => (State::InHeaderRow, true),
                Some("tr") => (State::InDataRow, true),
                _ if node.is_blank() => (state, false),
                _ => {
                    self.skipped(node);
                    (state, false)
                }
            },
            State::InHeaderRow | State::InBrowserNames => match node.as_element() {
                Some(th) if th.tag == "th" => {
                    if state == State::InHeaderRow {
                        self.read_feature_header(th);
                    } else {
                        self.read_browser_header(th);
                    }
                    (State::InBrowserNames, false)
                }
                _ if node.is_blank() => (state, false),
                _ => {
                    self.skipped(node);
                    (state, false)
                }
            },
            State::InDataRow => match node.as_element() {
                Some(td) if matches!(td.tag.as_str(), "td" | "th") => {
                    self.read_cell(td);
                    (state, false)
                }
                _ if node.is_blank() => (state, false),
                _ => {
                    self.skipped(node);
                    (state, false)
                }
            },
        }
    }

    fn leaving(&mut self, state: State, node: &Node) -> State {
        match (state, node.tag()) {
            (State::InHeaderRow | State::InBrowserNames, Some("tr")) => {
                self.start_grid();
                State::ExtractedRow
            }
            (State::InDataRow, Some("tr")) => {
                self.table().row += 1;
                State::ExtractedRow
            }
            (State::InTable | State::ExtractedRow, Some("table")) => {
                self.finish_table();
                State::CompatDiv
            }
            (State::CompatDiv, Some("div")) if self.div == Some(node.span()) => {
                self.div = None;
                if self.table.take().is_some() {
                    log::debug!("Compat div without a table");
                }
                State::AfterCompatDiv
            }
            _ => state,
        }
    }

    fn finalize(mut self, _state: State) -> CompatSection {
        self.finish_table();
        let (mut bodies, found) = self.footnotes.finish();
        self.issues.extend(found);

        let mut used = HashSet::new();
        for support in self.divs.iter_mut().flat_map(|d| d.supports.iter_mut()) {
            let Some(reference) = &support.footnote_id else {
                continue;
            };
            match bodies.get(reference.id()) {
                Some(body) => {
                    support.footnote = Some(body.text.clone());
                    used.insert(reference.id().to_string());
                }
                None => self.issues.push(Issue::at(
                    IssueKind::FootnoteMissing,
                    reference.span(),
                    json!({"footnote_id": reference.id()}),
                )),
            }
        }
        bodies.retain(|id, _| !used.contains(id));
        for (id, body) in &bodies {
            self.issues.push(Issue::at(
                IssueKind::FootnoteUnused,
                body.span,
                json!({"footnote_id": id}),
            ));
        }

        CompatSection {
            divs: self.divs,
            footnotes: bodies.into_iter().map(|(id, body)| (id, body.text)).collect(),
            issues: self.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryStore;
    use crate::extractor::extract;
    use crate::grammar::Grammar;
    use crate::html::{Scope, parse_fragment};

    fn store() -> MemoryStore {
        MemoryStore::from_json(
            r#"{
                "browsers": [
                    {"id": 1, "name": "Firefox for Desktop", "slug": "firefox_desktop"},
                    {"id": 2, "name": "Chrome for Desktop", "slug": "chrome_desktop"}
                ],
                "versions": [
                    {"id": 10, "browser": 1, "version": "1.0"},
                    {"id": 20, "browser": 2, "version": "1.0"}
                ]
            }"#,
        )
        .unwrap()
    }

    fn section(html: &str) -> CompatSection {
        let fragment = parse_fragment(html, 0, Grammar::KUMASCRIPT, Scope::Page).unwrap();
        let mut data = Data::new(store());
        let subject = Subject {
            id: 100,
            slug: "web-css-background-size".into(),
        };
        extract(CompatibilityExtractor::new(&mut data, &subject), &fragment.nodes)
    }

    fn kinds(issues: &[Issue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    const H2: &str = "<h2 id=\"Browser_compatibility\">Browser compatibility</h2>\
                      <div>{{CompatibilityTable}}</div>";

    #[test]
    fn test_basic_table() {
        let section = section(&format!(
            "{H2}<div id=\"compat-desktop\"><table class=\"compat-table\"><tbody>\
             <tr><th>Feature</th><th>Firefox</th></tr>\
             <tr><td>Basic support</td><td>1.0</td></tr>\
             </tbody></table></div>"
        ));
        assert_eq!(section.issues, vec![]);
        assert_eq!(section.divs.len(), 1);
        let div = &section.divs[0];
        assert_eq!(div.name, "desktop");
        assert_eq!(div.browsers[0].id, Id::Known(1));
        assert_eq!(div.features[0].id, Id::Known(100));
        assert_eq!(div.versions[0].id, Id::Known(10));
        assert_eq!(div.supports.len(), 1);
        assert_eq!(div.supports[0].support, SupportLevel::Yes);
        assert_eq!(div.supports[0].id, Id::New("_100-10".into()));
    }

    #[test]
    fn test_rowspan_and_colspan() {
        let section = section(&format!(
            "{H2}<div id=\"compat-desktop\"><table>\
             <tr><th>Feature</th><th>Chrome</th><th>Firefox</th></tr>\
             <tr><td>Basic support</td><td rowspan=\"2\" colspan=\"2\">1.0</td></tr>\
             <tr><td>Other</td></tr>\
             </table></div>"
        ));
        assert_eq!(section.issues, vec![]);
        let div = &section.divs[0];
        assert_eq!(div.features.len(), 2);
        // One cell, two browsers, two features.
        assert_eq!(div.supports.len(), 4);
        assert_eq!(div.versions.len(), 2);
    }

    #[test]
    fn test_extra_and_out_of_bounds_cells() {
        let section = section(&format!(
            "{H2}<div id=\"compat-desktop\"><table>\
             <tr><th>Feature</th><th>Firefox</th></tr>\
             <tr><td>Basic support</td><td rowspan=\"2\">1.0</td><td>2.0</td></tr>\
             </table></div>"
        ));
        assert_eq!(
            kinds(&section.issues),
            vec![IssueKind::CellOutOfBounds, IssueKind::ExtraCell]
        );
        assert_eq!(section.divs[0].supports.len(), 1);
    }

    #[test]
    fn test_huge_spans_stay_inside_the_table() {
        let section = section(&format!(
            "{H2}<div id=\"compat-desktop\"><table>\
             <tr><th>Feature</th><th>Firefox</th></tr>\
             <tr><td>Basic support</td><td rowspan=\"18446744073709551615\">1.0</td></tr>\
             <tr><td>Other</td><td colspan=\"99999999\">1.0</td></tr>\
             </table></div>"
        ));
        assert_eq!(
            kinds(&section.issues),
            vec![IssueKind::CellOutOfBounds, IssueKind::ExtraCell]
        );
        let div = &section.divs[0];
        assert_eq!(div.features.len(), 2);
        assert_eq!(div.supports.len(), 2);
    }

    #[test]
    fn test_huge_header_colspan_is_capped() {
        let section = section(&format!(
            "{H2}<div id=\"compat-desktop\"><table>\
             <tr><th>Feature</th><th colspan=\"4000000000\">Firefox</th></tr>\
             <tr><td>Basic support</td><td>1.0</td></tr>\
             </table></div>"
        ));
        assert_eq!(kinds(&section.issues), vec![IssueKind::CellOutOfBounds]);
        assert_eq!(section.divs[0].browsers.len(), 1);
        assert_eq!(section.divs[0].supports.len(), 1);
    }

    #[test]
    fn test_header_issues() {
        let section = section(&format!(
            "{H2}<div id=\"compat-mobile\"><table>\
             <tr><th>Features</th><th class=\"x\">Fire</th></tr>\
             <tr><td>Basic support</td><td>1.0</td></tr>\
             </table></div>"
        ));
        assert_eq!(
            kinds(&section.issues),
            vec![
                IssueKind::FeatureHeader,
                IssueKind::UnexpectedAttribute,
                IssueKind::UnknownBrowser,
            ]
        );
        let div = &section.divs[0];
        assert_eq!(div.name, "mobile");
        assert_eq!(div.browsers[0].id, Id::New("_Fire".into()));
        assert_eq!(div.versions[0].id, Id::New("_Fire-1.0".into()));
    }

    #[test]
    fn test_unknown_version_reported_once() {
        let section = section(&format!(
            "{H2}<div id=\"compat-desktop\"><table>\
             <tr><th>Feature</th><th>Firefox</th></tr>\
             <tr><td>Basic support</td><td>2.0</td></tr>\
             <tr><td>Other</td><td>2.0</td></tr>\
             </table></div>"
        ));
        assert_eq!(kinds(&section.issues), vec![IssueKind::UnknownVersion]);
        assert_eq!(section.issues[0].args["browser_slug"], "firefox_desktop");
        assert_eq!(section.issues[0].args["browser_id"], 1);
    }

    #[test]
    fn test_footnotes_merged() {
        let section = section(&format!(
            "{H2}<div id=\"compat-desktop\"><table>\
             <tr><th>Feature</th><th>Firefox</th></tr>\
             <tr><td>Basic support</td><td>1.0 [1]</td></tr>\
             <tr><td>Other</td><td>1.0 [3]</td></tr>\
             </table></div>\
             <p>[1] Behind a flag.</p>\
             <p>[2] Never used.</p>"
        ));
        assert_eq!(
            kinds(&section.issues),
            vec![IssueKind::FootnoteMissing, IssueKind::FootnoteUnused]
        );
        let supports = &section.divs[0].supports;
        assert_eq!(supports[0].footnote.as_deref(), Some("Behind a flag."));
        assert_eq!(supports[1].footnote, None);
        assert_eq!(section.footnotes.keys().collect::<Vec<_>>(), vec!["2"]);
    }

    #[test]
    fn test_content_before_div_is_skipped() {
        let section = section(&format!("{H2}<p>Some prose.</p>"));
        assert_eq!(kinds(&section.issues), vec![IssueKind::SkippedContent]);
        assert!(section.divs.is_empty());
    }
}
