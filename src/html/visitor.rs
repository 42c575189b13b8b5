//! Conversion of the rowan tree into [`Node`] values.

use serde_json::json;

use super::{
    Attribute, AttributeActions, AttributeValue, Attributes, CellMarker, CellVersion, CloseTag,
    Element, Footnote, MarkerKind, Node, OpenTag, Scope, Span, Text,
};
use crate::grammar::tokens::CELL_VERSION;
use crate::grammar::{Grammar, ParseError};
use crate::issues::{Issue, IssueKind};
use crate::kumascript::{Macro, unquote_arg};
use crate::syntax::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

const MDN_ORIGIN: &str = "https://developer.mozilla.org";

/// Visited nodes of a fragment, with the issues found on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
    pub issues: Vec<Issue>,
}

impl Fragment {
    /// The single top-level element, if the fragment is one element
    /// surrounded by blank text at most.
    pub fn single_element(&self) -> Option<&Element> {
        let mut elements = self.nodes.iter().filter(|n| !n.is_blank());
        let only = elements.next()?.as_element()?;
        elements.next().is_none().then_some(only)
    }
}

/// Parse `text` with `grammar` and visit it in `scope`.
///
/// `offset` is the position of `text` in the page, so node spans and issue
/// spans are absolute.
pub fn parse_fragment(
    text: &str,
    offset: usize,
    grammar: Grammar,
    scope: Scope,
) -> Result<Fragment, ParseError> {
    let tree = grammar.parse(text).map_err(|err| ParseError {
        pos: err.pos + offset,
        farthest: err.farthest + offset,
        expected: err.expected,
    })?;
    Ok(Visitor::new(offset, scope).visit_document(&tree))
}

/// Parse an element's markup again under another grammar and scope.
///
/// Cells are first visited as part of the whole page; extractors reparse
/// them to pick up context-specific tokens and scope checks.
pub fn reparse_element(
    element: &Element,
    grammar: Grammar,
    scope: Scope,
) -> Result<(Element, Vec<Issue>), ParseError> {
    let Fragment { nodes, issues } =
        parse_fragment(&element.raw, element.span.start, grammar, scope)?;
    match nodes.into_iter().next() {
        Some(Node::Element(element)) => Ok((element, issues)),
        other => unreachable!("reparsed element became {other:?}"),
    }
}

pub struct Visitor {
    offset: usize,
    scope: Scope,
    issues: Vec<Issue>,
    p_depth: usize,
}

impl Visitor {
    pub fn new(offset: usize, scope: Scope) -> Self {
        Self {
            offset,
            scope,
            issues: Vec::new(),
            p_depth: 0,
        }
    }

    pub fn visit_document(mut self, tree: &SyntaxNode) -> Fragment {
        let nodes = self.visit_content(tree.children_with_tokens());
        Fragment {
            nodes,
            issues: self.issues,
        }
    }

    fn span_of(&self, range: rowan::TextRange) -> Span {
        Span::new(
            usize::from(range.start()) + self.offset,
            usize::from(range.end()) + self.offset,
        )
    }

    fn visit_content(&mut self, children: impl Iterator<Item = SyntaxElement>) -> Vec<Node> {
        let mut nodes = Vec::new();
        for child in children {
            match child {
                SyntaxElement::Node(node) => match node.kind() {
                    SyntaxKind::ELEMENT => nodes.push(Node::Element(self.visit_element(&node))),
                    SyntaxKind::MACRO => nodes.push(Node::Macro(self.visit_macro(&node))),
                    SyntaxKind::WHY_NO_SPEC => {
                        nodes.push(Node::Macro(self.visit_why_no_spec(&node)))
                    }
                    SyntaxKind::OPEN_TAG | SyntaxKind::CLOSE_TAG => {}
                    other => unreachable!("unexpected {other:?} node in content"),
                },
                SyntaxElement::Token(token) => {
                    if let Some(node) = self.visit_token(&token)
                        && !Self::merge_text(&mut nodes, &node)
                    {
                        nodes.push(node);
                    }
                }
            }
        }
        nodes
    }

    /// Extend a trailing text node with an adjacent one.
    fn merge_text(nodes: &mut [Node], next: &Node) -> bool {
        let (Some(Node::Text(prev)), Node::Text(next)) = (nodes.last_mut(), next) else {
            return false;
        };
        if prev.span.end != next.span.start || prev.raw.is_empty() {
            return false;
        }
        *prev = Text::new(format!("{}{}", prev.raw, next.raw), prev.span.start);
        true
    }

    fn visit_token(&mut self, token: &SyntaxToken) -> Option<Node> {
        let span = self.span_of(token.text_range());
        let raw = token.text();
        let node = match token.kind() {
            SyntaxKind::TEXT | SyntaxKind::RAW_TEXT => Node::Text(Text::new(raw, span.start)),
            SyntaxKind::FOOTNOTE_MARKER => Node::Footnote(Footnote::new(raw, span.start)),
            SyntaxKind::CELL_VERSION => {
                let caps = CELL_VERSION.captures(raw)?;
                let version = caps.name("version").map_or("", |m| m.as_str());
                let engine = caps.name("eng_version").map(|m| m.as_str());
                Node::Version(CellVersion::new(raw, span.start, version, engine))
            }
            SyntaxKind::CELL_REMOVED => {
                Node::Marker(CellMarker::new(raw, span.start, MarkerKind::Removed))
            }
            SyntaxKind::CELL_NOPREFIX => {
                Node::Marker(CellMarker::new(raw, span.start, MarkerKind::NoPrefix))
            }
            SyntaxKind::CELL_PARTIAL => {
                Node::Marker(CellMarker::new(raw, span.start, MarkerKind::Partial))
            }
            SyntaxKind::WHITESPACE => return None,
            other => unreachable!("unexpected {other:?} token in content"),
        };
        Some(node)
    }

    fn visit_element(&mut self, node: &SyntaxNode) -> Element {
        let span = self.span_of(node.text_range());
        let open_node = node
            .children()
            .find(|n| n.kind() == SyntaxKind::OPEN_TAG)
            .unwrap_or_else(|| unreachable!("element without open tag"));
        let mut open = self.visit_open_tag(&open_node);

        let (attributes, issues) = AttributeActions::for_tag(self.scope, &open.tag).validate(&open);
        open.attributes = attributes;
        self.issues.extend(issues);
        if open.tag == "a" {
            absolutize_href(&mut open.attributes);
        }

        let is_p = open.tag == "p";
        if is_p {
            if self.p_depth > 0 {
                self.issues
                    .push(Issue::at(IssueKind::NestedP, span, json!({})));
            }
            self.p_depth += 1;
        }
        let children = self.visit_content(node.children_with_tokens().filter(|c| {
            !matches!(c.kind(), SyntaxKind::OPEN_TAG | SyntaxKind::CLOSE_TAG)
        }));
        if is_p {
            self.p_depth -= 1;
        }

        let close = node
            .children()
            .find(|n| n.kind() == SyntaxKind::CLOSE_TAG)
            .map(|n| CloseTag {
                span: self.span_of(n.text_range()),
                raw: n.text().to_string(),
                tag: open.tag.clone(),
            });

        let level = match open.tag.as_bytes() {
            [b'h', n @ b'1'..=b'6'] => Some(n - b'0'),
            _ => None,
        };
        Element {
            span,
            raw: node.text().to_string(),
            tag: open.tag.clone(),
            open,
            close,
            children,
            level,
            drop: false,
        }
    }

    fn visit_open_tag(&mut self, node: &SyntaxNode) -> OpenTag {
        let tag = node
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token)
            .find(|t| t.kind() == SyntaxKind::TAG_NAME)
            .map(|t| t.text().to_ascii_lowercase())
            .unwrap_or_default();
        let mut attributes = Attributes::new();
        for attr in node.children().filter(|n| n.kind() == SyntaxKind::ATTRIBUTE) {
            attributes.insert(self.visit_attribute(&attr));
        }
        OpenTag {
            span: self.span_of(node.text_range()),
            raw: node.text().to_string(),
            tag,
            attributes,
        }
    }

    fn visit_attribute(&mut self, node: &SyntaxNode) -> Attribute {
        let mut name = String::new();
        let mut value = AttributeValue::Flag;
        for token in node.children_with_tokens().filter_map(SyntaxElement::into_token) {
            match token.kind() {
                SyntaxKind::ATTRIBUTE_NAME => name = token.text().to_ascii_lowercase(),
                SyntaxKind::ATTRIBUTE_VALUE => {
                    let text = token.text();
                    value = if text.starts_with(['"', '\'']) {
                        AttributeValue::Quoted(unquote_arg(text))
                    } else {
                        AttributeValue::Bare(text.to_string())
                    };
                }
                _ => {}
            }
        }
        Attribute {
            span: self.span_of(node.text_range()),
            raw: node.text().to_string(),
            name,
            value,
        }
    }

    fn visit_macro(&mut self, node: &SyntaxNode) -> Macro {
        let span = self.span_of(node.text_range());
        let mut name = String::new();
        let mut raw_args = Vec::new();
        for token in node
            .descendants_with_tokens()
            .filter_map(SyntaxElement::into_token)
        {
            match token.kind() {
                SyntaxKind::MACRO_NAME => name = token.text().to_string(),
                SyntaxKind::MACRO_ARG => raw_args.push(token),
                _ => {}
            }
        }
        // `{{X()}}` has no arguments; `{{X("")}}` has one empty argument.
        let args = match raw_args.as_slice() {
            [only] if only.text().trim().is_empty() => Vec::new(),
            raw => raw.iter().map(|t| unquote_arg(t.text())).collect(),
        };
        let mac = Macro::new(&name, args, span, node.text().to_string(), self.scope);
        self.issues.extend(mac.issues().iter().cloned());
        mac
    }

    fn visit_why_no_spec(&mut self, node: &SyntaxNode) -> Macro {
        let span = self.span_of(node.text_range());
        let body = node
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token)
            .find(|t| t.kind() == SyntaxKind::MACRO_BODY)
            .map(|t| t.text().to_string())
            .unwrap_or_default();
        let mac = Macro::why_no_spec(body, span, node.text().to_string(), self.scope);
        self.issues.extend(mac.issues().iter().cloned());
        mac
    }
}

/// Make a site-relative link absolute.
fn absolutize_href(attributes: &mut Attributes) {
    let Some(href) = attributes.get("href") else {
        return;
    };
    let value = href.value_str();
    if !value.starts_with('/') || value.starts_with("//") {
        return;
    }
    let mut href = href.clone();
    href.value = AttributeValue::Quoted(format!("{MDN_ORIGIN}{value}"));
    attributes.insert(href);
}
