//! Backtracking recursive-descent engine for [`Grammar`].
//!
//! Rules push events into a buffer instead of building the green tree
//! directly, so an alternative that fails halfway can be rewound to a
//! checkpoint. The surviving events are replayed into a
//! [`GreenNodeBuilder`] once the whole input has been consumed.

use rowan::{GreenNode, GreenNodeBuilder};

use super::tokens::{self, WhyNoSpecMatch};
use super::{Grammar, ParseError, TextToken};
use crate::syntax::SyntaxKind;

/// Elements with HTML content.
const CONTAINER_TAGS: &[&str] = &[
    "a", "dd", "div", "dl", "dt", "em", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ol", "p",
    "span", "strong", "sup", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

/// Elements whose content is kept verbatim up to the close tag.
const RAW_TAGS: &[&str] = &["code", "pre"];

/// Elements without content or close tag.
const VOID_TAGS: &[&str] = &["br"];

pub(crate) fn is_allowed_tag(tag: &str) -> bool {
    CONTAINER_TAGS.contains(&tag) || RAW_TAGS.contains(&tag) || VOID_TAGS.contains(&tag)
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

#[derive(Debug, Clone, Copy)]
enum Event {
    Start(SyntaxKind),
    Token(SyntaxKind, usize),
    Finish,
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    pos: usize,
    events: usize,
}

pub(crate) struct Parser<'a> {
    text: &'a str,
    grammar: Grammar,
    pos: usize,
    events: Vec<Event>,
    farthest: usize,
    expected: Vec<&'static str>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(text: &'a str, grammar: Grammar) -> Self {
        Self {
            text,
            grammar,
            pos: 0,
            events: Vec::new(),
            farthest: 0,
            expected: Vec::new(),
        }
    }

    pub(crate) fn parse(mut self) -> Result<GreenNode, ParseError> {
        log::trace!(
            "Parsing {} bytes with the {} grammar",
            self.text.len(),
            self.grammar.name()
        );
        self.start(SyntaxKind::DOCUMENT);
        self.content();
        self.finish();

        if self.pos < self.text.len() {
            log::debug!(
                "Incomplete parse at {} (farthest {}, expected {:?})",
                self.pos,
                self.farthest,
                self.expected
            );
            return Err(ParseError {
                pos: self.pos,
                farthest: self.farthest.max(self.pos),
                expected: self.expected,
            });
        }
        Ok(self.build())
    }

    fn build(self) -> GreenNode {
        let mut builder = GreenNodeBuilder::new();
        let mut offset = 0;
        for event in self.events {
            match event {
                Event::Start(kind) => builder.start_node(kind.into()),
                Event::Token(kind, len) => {
                    builder.token(kind.into(), &self.text[offset..offset + len]);
                    offset += len;
                }
                Event::Finish => builder.finish_node(),
            }
        }
        builder.finish()
    }

    // Event plumbing

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            events: self.events.len(),
        }
    }

    fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.events.truncate(checkpoint.events);
    }

    fn start(&mut self, kind: SyntaxKind) {
        self.events.push(Event::Start(kind));
    }

    fn finish(&mut self) {
        self.events.push(Event::Finish);
    }

    fn token(&mut self, kind: SyntaxKind, len: usize) {
        self.events.push(Event::Token(kind, len));
        self.pos += len;
    }

    fn expect(&mut self, what: &'static str) -> bool {
        if self.pos > self.farthest {
            self.farthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.farthest && !self.expected.contains(&what) {
            self.expected.push(what);
        }
        false
    }

    fn literal(&mut self, kind: SyntaxKind, literal: &'static str) -> bool {
        if self.rest().starts_with(literal) {
            self.token(kind, literal.len());
            true
        } else {
            self.expect(literal)
        }
    }

    fn whitespace(&mut self) {
        let len = tokens::whitespace_len(self.rest());
        if len > 0 {
            self.token(SyntaxKind::WHITESPACE, len);
        }
    }

    // Structure

    /// Zero or more elements and text tokens. Empty content still produces
    /// one empty text token so every container has at least one child.
    fn content(&mut self) {
        let before = self.events.len();
        while self.pos < self.text.len() {
            if !(self.element() || self.text_token()) {
                break;
            }
        }
        if self.events.len() == before {
            self.token(SyntaxKind::TEXT, 0);
        }
    }

    fn element(&mut self) -> bool {
        let rest = self.rest();
        if !rest.starts_with('<') || rest.starts_with("</") {
            return false;
        }
        let checkpoint = self.checkpoint();
        self.start(SyntaxKind::ELEMENT);

        let Some((tag, self_closed)) = self.open_tag() else {
            self.rewind(checkpoint);
            return false;
        };

        if is_void_tag(&tag) || self_closed {
            if !is_void_tag(&tag) {
                log::trace!("Self-closed container <{}/> at {}", tag, checkpoint.pos);
                self.rewind(checkpoint);
                return self.expect("a close tag");
            }
            self.finish();
            return true;
        }

        if RAW_TAGS.contains(&tag.as_str()) {
            self.raw_content(&tag);
        } else {
            self.content();
        }

        if self.close_tag(&tag) {
            self.finish();
            true
        } else {
            self.rewind(checkpoint);
            false
        }
    }

    fn open_tag(&mut self) -> Option<(String, bool)> {
        self.start(SyntaxKind::OPEN_TAG);
        self.token(SyntaxKind::TAG_START, 1);

        let name_len = tag_name_len(self.rest());
        let tag = self.rest()[..name_len].to_ascii_lowercase();
        if name_len == 0 || !is_allowed_tag(&tag) {
            self.expect("an allowed tag name");
            return None;
        }
        self.token(SyntaxKind::TAG_NAME, name_len);

        loop {
            let checkpoint = self.checkpoint();
            let ws = tokens::whitespace_len(self.rest());
            self.whitespace();
            if ws == 0 || !self.attribute() {
                self.rewind(checkpoint);
                break;
            }
        }
        self.whitespace();

        let self_closed = if self.literal(SyntaxKind::TAG_SELF_CLOSE, "/>") {
            true
        } else if self.literal(SyntaxKind::TAG_END, ">") {
            false
        } else {
            return None;
        };
        self.finish();
        Some((tag, self_closed))
    }

    fn attribute(&mut self) -> bool {
        let name_len = attribute_name_len(self.rest());
        if name_len == 0 {
            return self.expect("an attribute name");
        }
        self.start(SyntaxKind::ATTRIBUTE);
        self.token(SyntaxKind::ATTRIBUTE_NAME, name_len);

        let checkpoint = self.checkpoint();
        self.whitespace();
        if self.literal(SyntaxKind::EQUALS, "=") {
            self.whitespace();
            let value_len = attribute_value_len(self.rest());
            if value_len == 0 {
                self.expect("an attribute value");
                self.rewind(checkpoint);
            } else {
                self.token(SyntaxKind::ATTRIBUTE_VALUE, value_len);
            }
        } else {
            // Boolean attribute
            self.rewind(checkpoint);
        }
        self.finish();
        true
    }

    fn close_tag(&mut self, tag: &str) -> bool {
        let rest = self.rest();
        let matches = rest.starts_with("</")
            && rest.len() >= 2 + tag.len()
            && rest.is_char_boundary(2 + tag.len())
            && rest[2..2 + tag.len()].eq_ignore_ascii_case(tag);
        if !matches {
            return self.expect("a close tag");
        }
        let checkpoint = self.checkpoint();
        self.start(SyntaxKind::CLOSE_TAG);
        self.token(SyntaxKind::TAG_START, 2);
        self.token(SyntaxKind::TAG_NAME, tag.len());
        self.whitespace();
        if !self.literal(SyntaxKind::TAG_END, ">") {
            self.rewind(checkpoint);
            return false;
        }
        self.finish();
        true
    }

    fn raw_content(&mut self, tag: &str) {
        let close = format!("</{}", tag);
        let rest = self.rest();
        let len = rest
            .to_ascii_lowercase()
            .find(&close)
            .unwrap_or(rest.len());
        self.token(SyntaxKind::RAW_TEXT, len);
    }

    // Text

    /// One text token: a context token if one matches, else a plain run.
    fn text_token(&mut self) -> bool {
        for &token in self.grammar.tokens() {
            if self.context_token(token) {
                return true;
            }
        }
        self.text_run()
    }

    fn context_token(&mut self, token: TextToken) -> bool {
        let rest = self.rest();
        match token {
            TextToken::Macro => self.why_no_spec() || self.macro_call(),
            TextToken::CellVersion => self.simple_token(
                SyntaxKind::CELL_VERSION,
                tokens::try_parse_cell_version(rest),
            ),
            TextToken::Footnote => self.simple_token(
                SyntaxKind::FOOTNOTE_MARKER,
                tokens::try_parse_footnote_marker(rest),
            ),
            TextToken::CellRemoved => self.simple_token(
                SyntaxKind::CELL_REMOVED,
                tokens::try_parse_cell_removed(rest),
            ),
            TextToken::CellNoPrefix => self.simple_token(
                SyntaxKind::CELL_NOPREFIX,
                tokens::try_parse_cell_noprefix(rest),
            ),
            TextToken::CellPartial => self.simple_token(
                SyntaxKind::CELL_PARTIAL,
                tokens::try_parse_cell_partial(rest),
            ),
        }
    }

    fn simple_token(&mut self, kind: SyntaxKind, len: Option<usize>) -> bool {
        match len {
            Some(len) if len > 0 => {
                self.token(kind, len);
                true
            }
            _ => false,
        }
    }

    /// A run of plain text up to the next tag or context token opener.
    ///
    /// An opener that does not start a real token (a lone `{` or `[`) is
    /// taken as a one-character run.
    fn text_run(&mut self) -> bool {
        let macros = self.grammar.recognizes(TextToken::Macro);
        let footnotes = self.grammar.recognizes(TextToken::Footnote);
        let rest = self.rest();

        let mut len = 0;
        for (i, c) in rest.char_indices() {
            let stop = c == '<' || (macros && c == '{') || (footnotes && c == '[');
            if stop {
                break;
            }
            len = i + c.len_utf8();
        }
        if len == 0 {
            match rest.chars().next() {
                Some(c @ ('{' | '[')) => len = c.len_utf8(),
                _ => return self.expect("text"),
            }
        }
        self.token(SyntaxKind::TEXT, len);
        true
    }

    // Macros

    fn macro_call(&mut self) -> bool {
        if !self.rest().starts_with("{{") {
            return false;
        }
        let checkpoint = self.checkpoint();
        self.start(SyntaxKind::MACRO);
        self.token(SyntaxKind::MACRO_START, 2);
        self.whitespace();

        let Some(name_len) = tokens::macro_name_len(self.rest()) else {
            self.expect("a macro name");
            self.rewind(checkpoint);
            return false;
        };
        self.token(SyntaxKind::MACRO_NAME, name_len);
        self.whitespace();

        if self.rest().starts_with('(') && !self.macro_args() {
            self.rewind(checkpoint);
            return false;
        }
        self.whitespace();

        if !self.literal(SyntaxKind::MACRO_END, "}}") {
            self.rewind(checkpoint);
            return false;
        }
        self.finish();
        true
    }

    fn macro_args(&mut self) -> bool {
        self.start(SyntaxKind::MACRO_ARGS);
        self.token(SyntaxKind::L_PAREN, 1);
        loop {
            self.whitespace();
            let len = tokens::macro_arg_len(self.rest());
            self.token(SyntaxKind::MACRO_ARG, len);
            self.whitespace();
            if !self.literal(SyntaxKind::COMMA, ",") {
                break;
            }
        }
        if !self.literal(SyntaxKind::R_PAREN, ")") {
            return false;
        }
        self.finish();
        true
    }

    fn why_no_spec(&mut self) -> bool {
        let Some(WhyNoSpecMatch {
            start_len,
            body_len,
            end_len,
        }) = tokens::try_parse_why_no_spec(self.rest())
        else {
            return false;
        };
        self.start(SyntaxKind::WHY_NO_SPEC);
        self.macro_marker(start_len);
        self.token(SyntaxKind::MACRO_BODY, body_len);
        self.macro_marker(end_len);
        self.finish();
        true
    }

    /// Emit an argument-less `{{ Name }}` whose extent is already known.
    fn macro_marker(&mut self, len: usize) {
        let end = self.pos + len;
        self.start(SyntaxKind::MACRO);
        self.token(SyntaxKind::MACRO_START, 2);
        self.whitespace();
        let name_len = tokens::macro_name_len(self.rest()).unwrap_or(0);
        self.token(SyntaxKind::MACRO_NAME, name_len);
        self.whitespace();
        self.token(SyntaxKind::MACRO_END, end - self.pos);
        self.finish();
    }
}

fn tag_name_len(text: &str) -> usize {
    text.bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count()
}

fn attribute_name_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    if !bytes.first().is_some_and(|b| b.is_ascii_alphabetic()) {
        return 0;
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b':' | b'_'))
        .count()
}

fn attribute_value_len(text: &str) -> usize {
    match text.as_bytes().first() {
        Some(&quote @ (b'"' | b'\'')) => {
            let mut escaped = false;
            for (i, b) in text.bytes().enumerate().skip(1) {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == quote {
                    return i + 1;
                }
            }
            0
        }
        _ => text
            .bytes()
            .take_while(|b| !b.is_ascii_whitespace() && !matches!(b, b'"' | b'\'' | b'=' | b'<' | b'>' | b'`'))
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxNode;

    fn parse(grammar: Grammar, text: &str) -> SyntaxNode {
        SyntaxNode::new_root(Parser::new(text, grammar).parse().unwrap())
    }

    #[test]
    fn test_attribute_value_lengths() {
        assert_eq!(attribute_value_len("\"2\">"), 3);
        assert_eq!(attribute_value_len(r#""a\"b" x"#), 6);
        assert_eq!(attribute_value_len("2>"), 1);
        assert_eq!(attribute_value_len("\"open"), 0);
    }

    #[test]
    fn test_boolean_attribute() {
        let tree = parse(Grammar::HTML, "<td selected>x</td>");
        let attr = tree
            .descendants()
            .find(|n| n.kind() == SyntaxKind::ATTRIBUTE)
            .unwrap();
        assert_eq!(attr.text().to_string(), "selected");
    }

    #[test]
    fn test_raw_code_content() {
        let tree = parse(Grammar::KUMASCRIPT, "<code>{{x}} <b></code>");
        assert!(tree.descendants().all(|n| n.kind() != SyntaxKind::MACRO));
        let raw = tree
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == SyntaxKind::RAW_TEXT)
            .unwrap();
        assert_eq!(raw.text(), "{{x}} <b>");
    }

    #[test]
    fn test_break_variants() {
        for text in ["<br>", "<br/>", "<br />"] {
            let tree = parse(Grammar::HTML, text);
            assert_eq!(tree.text().to_string(), text);
        }
    }

    #[test]
    fn test_single_curly_is_text() {
        let tree = parse(Grammar::KUMASCRIPT, "<td>{ no macro }</td>");
        assert!(tree.descendants().all(|n| n.kind() != SyntaxKind::MACRO));
    }

    #[test]
    fn test_macro_with_args_and_whitespace() {
        let tree = parse(
            Grammar::KUMASCRIPT,
            "{{ SpecName('CSS3 Backgrounds', '#the-background-size', 'background-size') }}",
        );
        let args: Vec<_> = tree
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::MACRO_ARG)
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(
            args,
            vec![
                "'CSS3 Backgrounds'",
                "'#the-background-size'",
                "'background-size'"
            ]
        );
    }

    #[test]
    fn test_unclosed_macro_is_text() {
        let tree = parse(Grammar::KUMASCRIPT, "{{CompatNo");
        assert!(tree.descendants().all(|n| n.kind() != SyntaxKind::MACRO));
    }

    #[test]
    fn test_why_no_spec_spans_tags() {
        let text = "<p>{{WhyNoSpecStart}}</p><p>Nothing.</p><p>{{WhyNoSpecEnd}}</p>";
        let tree = parse(Grammar::KUMASCRIPT, text);
        let block = tree
            .descendants()
            .find(|n| n.kind() == SyntaxKind::WHY_NO_SPEC)
            .unwrap();
        assert_eq!(
            block.text().to_string(),
            "{{WhyNoSpecStart}}</p><p>Nothing.</p><p>{{WhyNoSpecEnd}}"
        );
    }

    #[test]
    fn test_uppercase_tags() {
        let tree = parse(Grammar::HTML, "<TD>x</td>");
        assert_eq!(tree.text().to_string(), "<TD>x</td>");
    }
}
