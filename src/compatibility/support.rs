//! Browser support cells: one or more (version, support level) entries.

use serde_json::json;

use super::{FootnoteRef, SupportLevel};
use crate::grammar::Grammar;
use crate::html::{Element, Interval, MarkerKind, Node, Scope, Span, reparse_element};
use crate::issues::{Issue, IssueKind};
use crate::kumascript::{Macro, MacroKind};

const SCOPE: Scope = Scope::CompatibilitySupport;

/// Elements whose edges separate support entries.
const BLOCK_TAGS: &[&str] = &["p", "div", "ul", "ol", "li", "dl", "dt", "dd", "table"];

/// One support assertion read from a cell, before name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportEntry {
    pub version: String,
    /// Where the version came from, for version issues.
    pub span: Span,
    pub support: SupportLevel,
    pub prefix: Option<String>,
    pub footnote: Option<FootnoteRef>,
}

#[derive(Debug, Default)]
struct Pending {
    version: Option<(String, Span)>,
    level: Option<SupportLevel>,
    prefix: Option<String>,
    footnote: Option<FootnoteRef>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.version.is_none()
            && self.level.is_none()
            && self.prefix.is_none()
            && self.footnote.is_none()
    }
}

#[derive(Debug, Default)]
struct SupportReader {
    entries: Vec<SupportEntry>,
    pending: Pending,
    issues: Vec<Issue>,
}

impl SupportReader {
    /// Close the pending entry. Entries without a version are dropped.
    fn commit(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let Some((version, span)) = pending.version else {
            if !pending.is_empty() {
                log::debug!("Dropping support details without a version");
            }
            return;
        };
        let support = match pending.level {
            Some(level) => level,
            None if pending.prefix.is_some() && pending.footnote.is_some() => {
                SupportLevel::Partial
            }
            None => SupportLevel::Yes,
        };
        self.entries.push(SupportEntry {
            version,
            span,
            support,
            prefix: pending.prefix,
            footnote: pending.footnote,
        });
    }

    fn set_version(&mut self, version: &str, span: Span) {
        if self.pending.version.is_some() {
            self.commit();
        }
        self.pending.version = Some((version.to_string(), span));
    }

    fn visit(&mut self, node: &Node) {
        match node {
            Node::Text(text) => {
                if !text.cleaned.is_empty() {
                    self.issues.push(Issue::at(
                        IssueKind::InlineText,
                        text.span,
                        json!({"text": text.cleaned}),
                    ));
                }
            }
            Node::Version(version) => self.set_version(&version.version, version.span),
            Node::Marker(marker) => match marker.kind {
                MarkerKind::Removed => {
                    if self.pending.version.is_some() {
                        self.commit();
                    }
                    self.pending.level = Some(SupportLevel::No);
                }
                MarkerKind::Partial => self.pending.level = Some(SupportLevel::Partial),
                MarkerKind::NoPrefix => self.pending.prefix = None,
            },
            Node::Footnote(footnote) => {
                let reference =
                    FootnoteRef(footnote.id.clone(), footnote.span.start, footnote.span.end);
                match &self.pending.footnote {
                    Some(previous) => self.issues.push(Issue::at(
                        IssueKind::FootnoteMultiple,
                        footnote.span,
                        json!({"prev_footnote_id": previous.0, "footnote_id": footnote.id}),
                    )),
                    None => self.pending.footnote = Some(reference),
                }
            }
            Node::Macro(mac) => self.visit_macro(mac),
            Node::Element(element) => self.visit_element(element),
        }
    }

    fn visit_macro(&mut self, mac: &Macro) {
        match mac.kind() {
            MacroKind::CompatVersion { .. } | MacroKind::CompatGecko { .. } => {
                if let Some(version) = mac.version() {
                    self.set_version(version, mac.span());
                }
            }
            MacroKind::CompatVersionUnknown => self.set_version("current", mac.span()),
            MacroKind::CompatNightly => self.set_version("nightly", mac.span()),
            MacroKind::CompatNo => {
                self.set_version("current", mac.span());
                self.pending.level = Some(SupportLevel::No);
            }
            MacroKind::PropertyPrefix { prefix } => self.pending.prefix = Some(prefix.clone()),
            // Explicitly unknown support asserts nothing. Other macros were
            // already checked against the scope while reparsing.
            _ => {}
        }
    }

    fn visit_element(&mut self, element: &Element) {
        if element.tag == "br" {
            self.commit();
            return;
        }
        let block = BLOCK_TAGS.contains(&element.tag.as_str());
        if block {
            self.commit();
        }
        for child in &element.children {
            self.visit(child);
        }
        if block {
            self.commit();
        }
    }
}

/// Read the support entries of one cell.
///
/// The cell is reparsed with the support grammar; a parse failure is
/// reported as `halt_import` and yields no entries.
pub fn read_support_cell(td: &Element, issues: &mut Vec<Issue>) -> Vec<SupportEntry> {
    let td = match reparse_element(td, Grammar::COMPAT_SUPPORT, SCOPE) {
        Ok((td, found)) => {
            issues.extend(found);
            td
        }
        Err(err) => {
            issues.push(Issue::new(
                IssueKind::HaltImport,
                err.pos,
                td.span().end.max(err.pos),
                json!({}),
            ));
            return Vec::new();
        }
    };

    let mut reader = SupportReader::default();
    for child in &td.children {
        reader.visit(child);
    }
    reader.commit();
    issues.append(&mut reader.issues);
    reader.entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_fragment;

    fn read(html: &str) -> (Vec<SupportEntry>, Vec<Issue>) {
        let fragment = parse_fragment(html, 0, Grammar::KUMASCRIPT, Scope::Page).unwrap();
        let td = fragment.single_element().unwrap();
        let mut issues = Vec::new();
        let entries = read_support_cell(td, &mut issues);
        (entries, issues)
    }

    fn versions(entries: &[SupportEntry]) -> Vec<(&str, SupportLevel)> {
        entries
            .iter()
            .map(|e| (e.version.as_str(), e.support))
            .collect()
    }

    #[test]
    fn test_plain_version() {
        let (entries, issues) = read("<td>1.0</td>");
        assert!(issues.is_empty());
        assert_eq!(versions(&entries), vec![("1.0", SupportLevel::Yes)]);
        assert_eq!(entries[0].span, Span::new(4, 7));
    }

    #[test]
    fn test_prefix_and_footnote_is_partial() {
        let (entries, issues) = read(r#"<td>18{{property_prefix("-webkit")}} [1]</td>"#);
        assert!(issues.is_empty());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].version, "18.0");
        assert_eq!(entries[0].support, SupportLevel::Partial);
        assert_eq!(entries[0].prefix.as_deref(), Some("-webkit"));
        assert_eq!(entries[0].footnote, Some(FootnoteRef("1".into(), 37, 40)));
    }

    #[test]
    fn test_prefix_alone_is_yes() {
        let (entries, _) = read(r#"<td>4.0 {{property_prefix("-moz")}}</td>"#);
        assert_eq!(versions(&entries), vec![("4.0", SupportLevel::Yes)]);
    }

    #[test]
    fn test_break_commits_entries() {
        let (entries, issues) = read(
            r#"<td>4.0 {{property_prefix("-moz")}}<br>16.0 (unprefixed)</td>"#,
        );
        assert!(issues.is_empty());
        assert_eq!(
            versions(&entries),
            vec![("4.0", SupportLevel::Yes), ("16.0", SupportLevel::Yes)]
        );
        assert_eq!(entries[0].prefix.as_deref(), Some("-moz"));
        assert_eq!(entries[1].prefix, None);
    }

    #[test]
    fn test_removed_in() {
        let (entries, _) = read("<td>1.0<br>Removed in 20</td>");
        assert_eq!(
            versions(&entries),
            vec![("1.0", SupportLevel::Yes), ("20.0", SupportLevel::No)]
        );
    }

    #[test]
    fn test_partial_marker() {
        let (entries, _) = read("<td>10.0 (partial)</td>");
        assert_eq!(versions(&entries), vec![("10.0", SupportLevel::Partial)]);
    }

    #[test]
    fn test_macros() {
        let (entries, issues) = read(
            "<td>{{CompatVersionUnknown}}<br>{{CompatNo}}<br>{{CompatNightly}}<br>{{CompatUnknown}}</td>",
        );
        assert!(issues.is_empty());
        assert_eq!(
            versions(&entries),
            vec![
                ("current", SupportLevel::Yes),
                ("current", SupportLevel::No),
                ("nightly", SupportLevel::Yes),
            ]
        );
    }

    #[test]
    fn test_gecko_macro() {
        let (entries, issues) = read(r#"<td>{{CompatGeckoDesktop("1.9.2")}}</td>"#);
        assert!(issues.is_empty());
        assert_eq!(versions(&entries), vec![("3.6", SupportLevel::Yes)]);

        let (entries, issues) = read(r#"<td>{{CompatGeckoDesktop("1.7")}}</td>"#);
        assert!(issues.is_empty());
        assert_eq!(versions(&entries), vec![("1.0", SupportLevel::Yes)]);

        let (entries, issues) = read(r#"<td>{{CompatGeckoDesktop("3.5")}}</td>"#);
        assert!(entries.is_empty());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CompatGeckoDesktopUnknown);
        assert_eq!(issues[0].args["version"], "3.5");
    }

    #[test]
    fn test_inline_text() {
        let (entries, issues) = read("<td>1.0 with a flag</td>");
        assert_eq!(versions(&entries), vec![("1.0", SupportLevel::Yes)]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::InlineText);
        assert_eq!(issues[0].args["text"], "with a flag");
        assert_eq!(issues[0].span(), Span::new(8, 19));
    }

    #[test]
    fn test_multiple_footnotes() {
        let (entries, issues) = read("<td>1.0 [1][2]</td>");
        assert_eq!(entries[0].footnote, Some(FootnoteRef("1".into(), 8, 11)));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::FootnoteMultiple);
        assert_eq!(issues[0].args["prev_footnote_id"], "1");
        assert_eq!(issues[0].args["footnote_id"], "2");
    }

    #[test]
    fn test_asterisk_footnote() {
        let (entries, _) = read("<td>1.0 [**]</td>");
        assert_eq!(entries[0].footnote, Some(FootnoteRef("2".into(), 8, 12)));
    }

    #[test]
    fn test_paragraphs_are_entries() {
        let (entries, _) = read("<td><p>1.0</p><p>2.0 (partial)</p></td>");
        assert_eq!(
            versions(&entries),
            vec![("1.0", SupportLevel::Yes), ("2.0", SupportLevel::Partial)]
        );
    }
}
