//! Footnote paragraphs after the compatibility tables.
//!
//! A paragraph starting with a marker such as `[1]` opens a footnote.
//! Following paragraphs without a marker, and `<pre>` blocks, continue it.

use std::collections::BTreeMap;

use serde_json::json;

use crate::grammar::Grammar;
use crate::html::{Element, Footnote, Interval, Node, Scope, Span, reparse_element};
use crate::issues::{Issue, IssueKind};
use crate::utils::join_content;

/// A footnote body ready to attach to supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteBody {
    pub marker: String,
    pub text: String,
    pub span: Span,
}

#[derive(Debug)]
enum Paragraph {
    Html(String),
    Pre(String),
}

impl Paragraph {
    fn is_empty(&self) -> bool {
        matches!(self, Paragraph::Html(html) if html.is_empty())
    }
}

#[derive(Debug)]
struct Open {
    id: String,
    marker: String,
    span: Span,
    paragraphs: Vec<Paragraph>,
}

impl Open {
    fn into_body(mut self) -> FootnoteBody {
        while self.paragraphs.last().is_some_and(Paragraph::is_empty) {
            self.paragraphs.pop();
        }
        let first = self.paragraphs.iter().position(|p| !p.is_empty());
        let paragraphs = &self.paragraphs[first.unwrap_or(self.paragraphs.len())..];
        let text = match paragraphs {
            [Paragraph::Html(html)] => html.clone(),
            paragraphs => paragraphs
                .iter()
                .map(|p| match p {
                    Paragraph::Html(html) => format!("<p>{html}</p>"),
                    Paragraph::Pre(raw) => raw.clone(),
                })
                .collect(),
        };
        FootnoteBody {
            marker: self.marker,
            text,
            span: self.span,
        }
    }
}

#[derive(Debug, Default)]
pub struct FootnoteReader {
    footnotes: BTreeMap<String, FootnoteBody>,
    open: Option<Open>,
    issues: Vec<Issue>,
}

impl FootnoteReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one top-level node of the footnote area.
    pub fn push(&mut self, node: &Node) {
        if node.is_blank() {
            return;
        }
        match node.as_element() {
            Some(p) if p.tag == "p" => self.push_paragraph(p),
            Some(pre) if pre.tag == "pre" => self.push_pre(pre),
            _ => self
                .issues
                .push(Issue::at(IssueKind::FootnoteGap, node.span(), json!({}))),
        }
    }

    fn push_paragraph(&mut self, p: &Element) {
        let p = match reparse_element(p, Grammar::COMPAT_FOOTNOTE, Scope::Footnote) {
            Ok((p, found)) => {
                self.issues.extend(found);
                p
            }
            Err(err) => {
                self.issues.push(Issue::new(
                    IssueKind::HaltImport,
                    err.pos,
                    p.span.end.max(err.pos),
                    json!({}),
                ));
                return;
            }
        };

        let mut content = p.children.iter().filter(|n| !n.is_blank()).peekable();
        let leading = match content.peek() {
            Some(Node::Footnote(footnote)) => Some(footnote.clone()),
            _ => None,
        };
        if let Some(footnote) = &leading {
            content.next();
            self.start(footnote, p.span);
        }

        let mut bits = Vec::new();
        for node in content {
            match (node, &self.open) {
                (Node::Footnote(extra), Some(open)) => self.issues.push(Issue::at(
                    IssueKind::SecondFootnote,
                    extra.span,
                    json!({"original": open.marker, "new": extra.marker}),
                )),
                _ => bits.push(node.to_html()),
            }
        }
        let html = join_content(bits);

        match self.open.as_mut() {
            Some(open) => {
                open.span = open.span.cover(p.span);
                open.paragraphs.push(Paragraph::Html(html));
            }
            None if html.is_empty() => {}
            None => self
                .issues
                .push(Issue::at(IssueKind::FootnoteNoId, p.span, json!({}))),
        }
    }

    fn push_pre(&mut self, pre: &Element) {
        match self.open.as_mut() {
            Some(open) => {
                open.span = open.span.cover(pre.span);
                open.paragraphs.push(Paragraph::Pre(pre.raw.clone()));
            }
            None => self
                .issues
                .push(Issue::at(IssueKind::FootnoteNoId, pre.span, json!({}))),
        }
    }

    fn start(&mut self, footnote: &Footnote, span: Span) {
        self.close();
        self.open = Some(Open {
            id: footnote.id.clone(),
            marker: footnote.marker.clone(),
            span,
            paragraphs: Vec::new(),
        });
    }

    fn close(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };
        let id = open.id.clone();
        let body = open.into_body();
        match self.footnotes.get(&id) {
            Some(previous) => self.issues.push(Issue::at(
                IssueKind::FootnoteIdCollision,
                body.span,
                json!({
                    "marker": format!("[{}]", body.marker),
                    "previous_marker": format!("[{}]", previous.marker),
                    "footnote_id": id,
                }),
            )),
            None => {
                self.footnotes.insert(id, body);
            }
        }
    }

    pub fn finish(mut self) -> (BTreeMap<String, FootnoteBody>, Vec<Issue>) {
        self.close();
        (self.footnotes, self.issues)
    }
}
