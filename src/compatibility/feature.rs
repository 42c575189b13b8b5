//! First column of a compatibility table: the feature name and flags.

use serde_json::json;

use super::CompatFeature;
use crate::data::{Data, Subject};
use crate::grammar::Grammar;
use crate::html::{Element, Interval, Node, Scope, reparse_element};
use crate::issues::{Issue, IssueKind};
use crate::kumascript::{MacroKind, StatusFlag};
use crate::utils::join_content;

const SCOPE: Scope = Scope::CompatibilityFeature;

#[derive(Debug, Default)]
struct FeatureReader {
    bits: Vec<String>,
    code_first: bool,
    experimental: bool,
    obsolete: bool,
    standardized: bool,
    issues: Vec<Issue>,
}

impl FeatureReader {
    fn gather(&mut self, node: &Node) -> String {
        match node {
            Node::Text(text) => text.cleaned.clone(),
            Node::Element(element) => match element.tag.as_str() {
                "code" => element.to_html(),
                "br" => String::new(),
                tag => {
                    self.issues.push(Issue::at(
                        IssueKind::TagDropped,
                        element.span,
                        json!({"tag": tag, "scope": SCOPE}),
                    ));
                    let bits: Vec<String> = element.children.iter().map(|c| self.gather(c)).collect();
                    join_content(bits)
                }
            },
            Node::Macro(mac) => {
                match mac.kind() {
                    MacroKind::Status(StatusFlag::Experimental) => self.experimental = true,
                    MacroKind::Status(StatusFlag::Obsolete) => self.obsolete = true,
                    MacroKind::Status(StatusFlag::NonStandard) => self.standardized = false,
                    _ => {}
                }
                mac.to_html()
            }
            Node::Footnote(footnote) => {
                self.issues.push(Issue::at(
                    IssueKind::FootnoteFeature,
                    footnote.span,
                    json!({"footnote_id": footnote.id}),
                ));
                String::new()
            }
            Node::Version(_) | Node::Marker(_) => {
                unreachable!("support tokens in a feature cell")
            }
        }
    }

    fn read(&mut self, td: &Element) {
        for child in &td.children {
            let bit = self.gather(child);
            if bit.is_empty() {
                continue;
            }
            if self.bits.is_empty() {
                self.code_first = bit.starts_with("<code>");
            }
            self.bits.push(bit);
        }
    }

    /// The display name. A bit that is one `<code>` element is unwrapped.
    fn name(&self) -> String {
        let inner = |bit: &str| {
            bit.strip_prefix("<code>")?
                .strip_suffix("</code>")
                .filter(|body| !body.contains("</code>"))
                .map(str::to_string)
        };
        match self.bits.as_slice() {
            [only] => inner(only).unwrap_or_else(|| only.clone()),
            bits => join_content(bits),
        }
    }
}

/// Read a feature cell and resolve it under `subject`.
///
/// Returns `None` if the cell content cannot be parsed as a feature.
pub fn read_feature_cell(
    td: &Element,
    subject: &Subject,
    data: &mut Data,
    issues: &mut Vec<Issue>,
) -> Option<CompatFeature> {
    let td = match reparse_element(td, Grammar::COMPAT_FEATURE, SCOPE) {
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
            return None;
        }
    };

    let mut reader = FeatureReader {
        standardized: true,
        ..FeatureReader::default()
    };
    reader.read(&td);
    issues.append(&mut reader.issues);

    let name = reader.name();
    let lookup = data.lookup_feature(subject, &name);
    log::trace!("Feature cell {} resolved to {}", td.span, lookup.id);
    Some(CompatFeature {
        id: lookup.id,
        slug: lookup.slug,
        name,
        canonical: reader.code_first,
        experimental: reader.experimental,
        obsolete: reader.obsolete,
        standardized: reader.standardized,
    })
}
