use std::fmt;

use crate::kumascript::Macro;
use crate::utils::{cleanup_whitespace, join_content};

/// A `[start, end)` byte range in the scraped page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both.
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Anything that covers a slice of the source.
pub trait Interval {
    fn span(&self) -> Span;
    fn raw(&self) -> &str;

    fn start(&self) -> usize {
        self.span().start
    }

    fn end(&self) -> usize {
        self.span().end
    }
}

macro_rules! impl_interval {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Interval for $ty {
                fn span(&self) -> Span {
                    self.span
                }

                fn raw(&self) -> &str {
                    &self.raw
                }
            }
        )*
    };
}

impl_interval!(Text, Element, OpenTag, CloseTag, Attribute, Footnote, CellVersion, CellMarker);

/// One node of the visited tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(Text),
    Element(Element),
    Macro(Macro),
    Footnote(Footnote),
    Version(CellVersion),
    Marker(CellMarker),
}

impl Node {
    pub fn to_html(&self) -> String {
        match self {
            Node::Text(text) => text.cleaned.clone(),
            Node::Element(element) => element.to_html(),
            Node::Macro(mac) => mac.to_html(),
            Node::Footnote(_) | Node::Marker(_) => String::new(),
            Node::Version(version) => version.to_string(),
        }
    }

    /// Plain text without markup.
    pub fn to_text(&self) -> String {
        match self {
            Node::Text(text) => text.cleaned.clone(),
            Node::Element(element) => element.to_text(),
            Node::Version(version) => version.to_string(),
            Node::Macro(_) | Node::Footnote(_) | Node::Marker(_) => String::new(),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_macro(&self) -> Option<&Macro> {
        match self {
            Node::Macro(mac) => Some(mac),
            _ => None,
        }
    }

    /// Element tag name, if this is an element.
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|e| e.tag.as_str())
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            _ => &[],
        }
    }

    /// Whitespace-only text, which extractors skip between elements.
    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Text(text) if text.cleaned.is_empty())
    }
}

impl Interval for Node {
    fn span(&self) -> Span {
        match self {
            Node::Text(n) => n.span,
            Node::Element(n) => n.span,
            Node::Macro(n) => n.span(),
            Node::Footnote(n) => n.span,
            Node::Version(n) => n.span,
            Node::Marker(n) => n.span,
        }
    }

    fn raw(&self) -> &str {
        match self {
            Node::Text(n) => &n.raw,
            Node::Element(n) => &n.raw,
            Node::Macro(n) => n.raw(),
            Node::Footnote(n) => &n.raw,
            Node::Version(n) => &n.raw,
            Node::Marker(n) => &n.raw,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(n) => n.fmt(f),
            Node::Element(n) => n.fmt(f),
            Node::Macro(n) => n.fmt(f),
            Node::Footnote(n) => n.fmt(f),
            Node::Version(n) => n.fmt(f),
            Node::Marker(n) => n.fmt(f),
        }
    }
}

/// A run of text, with whitespace cleaned up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub span: Span,
    pub raw: String,
    pub cleaned: String,
}

impl Text {
    pub fn new(raw: impl Into<String>, start: usize) -> Self {
        let raw = raw.into();
        let cleaned = cleanup_whitespace(&raw);
        Self {
            span: Span::new(start, start + raw.len()),
            raw,
            cleaned,
        }
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cleaned)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// `name="value"` or `name='value'`, unescaped.
    Quoted(String),
    /// `name=value`
    Bare(String),
    /// `name` alone.
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub span: Span,
    pub raw: String,
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    /// The value as text; a flag attribute reads as its own name.
    pub fn value_str(&self) -> &str {
        match &self.value {
            AttributeValue::Quoted(v) | AttributeValue::Bare(v) => v,
            AttributeValue::Flag => &self.name,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            AttributeValue::Quoted(v) => write!(f, "{}=\"{}\"", self.name, v),
            AttributeValue::Bare(v) => write!(f, "{}={}", self.name, v),
            AttributeValue::Flag => f.write_str(&self.name),
        }
    }
}

/// Insertion-ordered attributes with unique names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute. A repeated name replaces the earlier value in place.
    pub fn insert(&mut self, attr: Attribute) {
        match self.0.iter_mut().find(|a| a.name == attr.name) {
            Some(existing) => *existing = attr,
            None => self.0.push(attr),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.iter().find(|a| a.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(Attribute::value_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        let index = self.0.iter().position(|a| a.name == name)?;
        Some(self.0.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            attr.fmt(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag {
    pub span: Span,
    pub raw: String,
    pub tag: String,
    pub attributes: Attributes,
}

impl fmt::Display for OpenTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attributes.is_empty() {
            write!(f, "<{}>", self.tag)
        } else {
            write!(f, "<{} {}>", self.tag, self.attributes)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseTag {
    pub span: Span,
    pub raw: String,
    pub tag: String,
}

impl fmt::Display for CloseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "</{}>", self.tag)
    }
}

/// An element with its tags and content. Void elements such as `<br>`
/// have no close tag and no children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub span: Span,
    pub raw: String,
    pub tag: String,
    pub open: OpenTag,
    pub close: Option<CloseTag>,
    pub children: Vec<Node>,
    /// Heading level for `<h1>` to `<h6>`.
    pub level: Option<u8>,
    /// Render the content only, without this element's own tags.
    pub drop: bool,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.open.attributes.value(name)
    }

    /// Numeric attribute such as `colspan`, defaulting to 1.
    pub fn span_attr(&self, name: &str) -> usize {
        self.attr(name)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1)
    }

    pub fn is_void(&self) -> bool {
        self.close.is_none()
    }

    /// Offset just past the open tag, where content begins.
    pub fn content_start(&self) -> usize {
        self.open.span.end
    }

    /// Content rendered back to markup.
    pub fn inner_html(&self) -> String {
        if self.tag == "pre" {
            return self.children.iter().map(|c| c.raw()).collect();
        }
        join_content(self.children.iter().map(Node::to_html))
    }

    pub fn to_html(&self) -> String {
        if self.drop {
            return self.inner_html();
        }
        match &self.close {
            None => self.open.to_string(),
            Some(close) => format!("{}{}{}", self.open, self.inner_html(), close),
        }
    }

    pub fn to_text(&self) -> String {
        join_content(self.children.iter().map(Node::to_text))
    }

    /// Child elements, skipping text and other nodes.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.close {
            None => self.open.fmt(f),
            Some(close) => {
                let content = join_content(self.children.iter().map(|c| c.to_string()));
                write!(f, "{}{}{}", self.open, content, close)
            }
        }
    }
}

/// A `[1]` or `[**]` footnote reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
    pub span: Span,
    pub raw: String,
    /// The text between the brackets.
    pub marker: String,
    /// Footnote id: the number, or the count of asterisks.
    pub id: String,
}

impl Footnote {
    pub fn new(raw: impl Into<String>, start: usize) -> Self {
        let raw = raw.into();
        let marker = raw
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim()
            .to_string();
        let id = if marker.starts_with('*') {
            marker.chars().count().to_string()
        } else {
            marker.clone()
        };
        Self {
            span: Span::new(start, start + raw.len()),
            raw,
            marker,
            id,
        }
    }
}

impl fmt::Display for Footnote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.marker)
    }
}

/// A version number in a support cell, like `1.0`, `18` or `1.0 (1.9.2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellVersion {
    pub span: Span,
    pub raw: String,
    /// Always dotted; a bare integer gets `.0` appended.
    pub version: String,
    pub engine_version: Option<String>,
}

impl CellVersion {
    pub fn new(
        raw: impl Into<String>,
        start: usize,
        version: &str,
        engine_version: Option<&str>,
    ) -> Self {
        let raw = raw.into();
        let version = if version.contains('.') {
            version.to_string()
        } else {
            format!("{version}.0")
        };
        Self {
            span: Span::new(start, start + raw.len()),
            raw,
            version,
            engine_version: engine_version.filter(|v| !v.is_empty()).map(str::to_string),
        }
    }
}

impl fmt::Display for CellVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.engine_version {
            None => f.write_str(&self.version),
            Some(engine) => write!(f, "{} ({})", self.version, engine),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// `Removed in`
    Removed,
    /// `(unprefixed)`, `without prefix` and similar.
    NoPrefix,
    /// `(partial)` or `, partial`.
    Partial,
}

/// A support-level marker in a support cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMarker {
    pub span: Span,
    pub raw: String,
    pub kind: MarkerKind,
}

impl CellMarker {
    pub fn new(raw: impl Into<String>, start: usize, kind: MarkerKind) -> Self {
        let raw = raw.into();
        Self {
            span: Span::new(start, start + raw.len()),
            raw,
            kind,
        }
    }
}

impl fmt::Display for CellMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw.trim())
    }
}
