//! Recognizers for the context-specific text tokens.
//!
//! Each `try_parse_*` function looks at the start of `text` and returns the
//! byte length of the match (plus any pieces the parser needs to emit it),
//! or `None` when the token does not start here.

use regex::Regex;
use std::sync::LazyLock;

static MACRO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^(){}\s]+").expect("macro name regex is valid"));

static DOUBLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"(?:[^"\\]|\\.)*""#).expect("double quote regex is valid"));

static SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^'(?:[^'\\]|\\.)*'").expect("single quote regex is valid"));

static BARE_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^,)\n]*").expect("bare argument regex is valid"));

static FOOTNOTE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(?:\d+|\*+)\]").expect("footnote regex is valid"));

pub(crate) static CELL_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<version>\d+(?:\.\d+)*)(?:\s+\((?P<eng_version>\d+(?:\.\d+)*)\))?\s*")
        .expect("cell version regex is valid")
});

static CELL_REMOVED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[Rr]emoved\s+[Ii]n\s*").expect("removed regex is valid"));

static WHY_NO_SPEC_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{\{\s*(?i:WhyNoSpecStart)\s*\}\}").expect("WhyNoSpecStart regex is valid")
});

static WHY_NO_SPEC_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(?i:WhyNoSpecEnd)\s*\}\}").expect("WhyNoSpecEnd regex is valid")
});

pub(crate) const NOPREFIX_MARKERS: &[&str] = &[
    "(unprefixed)",
    "(no prefix)",
    "without prefix",
    "(without prefix)",
];

pub(crate) const PARTIAL_MARKERS: &[&str] = &[", partial", "(partial)"];

/// Length of a run of HTML whitespace at the start of `text`.
pub(crate) fn whitespace_len(text: &str) -> usize {
    text.len()
        - text
            .trim_start_matches([' ', '\t', '\r', '\n'])
            .len()
}

/// Length of a macro name at the start of `text`.
pub(crate) fn macro_name_len(text: &str) -> Option<usize> {
    MACRO_NAME.find(text).map(|m| m.end())
}

/// Length of one macro argument: a quoted string or bare text up to `,`/`)`.
pub(crate) fn macro_arg_len(text: &str) -> usize {
    if let Some(m) = DOUBLE_QUOTED.find(text) {
        return m.end();
    }
    if let Some(m) = SINGLE_QUOTED.find(text) {
        return m.end();
    }
    let bare = BARE_ARG.find(text).map(|m| m.as_str()).unwrap_or("");
    bare.trim_end().len()
}

/// A `[1]` or `[**]` footnote marker.
pub(crate) fn try_parse_footnote_marker(text: &str) -> Option<usize> {
    FOOTNOTE_MARKER.find(text).map(|m| m.end())
}

/// A version like `1.0`, `18` or `1.0 (1.9.2)`, with trailing whitespace.
pub(crate) fn try_parse_cell_version(text: &str) -> Option<usize> {
    CELL_VERSION.find(text).map(|m| m.end())
}

/// `Removed in`, with trailing whitespace.
pub(crate) fn try_parse_cell_removed(text: &str) -> Option<usize> {
    CELL_REMOVED.find(text).map(|m| m.end())
}

/// One of the "no prefix" markers, with surrounding whitespace.
pub(crate) fn try_parse_cell_noprefix(text: &str) -> Option<usize> {
    try_parse_padded_literal(text, NOPREFIX_MARKERS)
}

/// One of the "partial support" markers, with surrounding whitespace.
pub(crate) fn try_parse_cell_partial(text: &str) -> Option<usize> {
    try_parse_padded_literal(text, PARTIAL_MARKERS)
}

fn try_parse_padded_literal(text: &str, literals: &[&str]) -> Option<usize> {
    let lead = whitespace_len(text);
    let rest = &text[lead..];
    let literal = literals.iter().find(|lit| rest.starts_with(*lit))?;
    let after = lead + literal.len();
    Some(after + whitespace_len(&text[after..]))
}

/// Pieces of a `{{WhyNoSpecStart}} ... {{WhyNoSpecEnd}}` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WhyNoSpecMatch {
    pub start_len: usize,
    pub body_len: usize,
    pub end_len: usize,
}

impl WhyNoSpecMatch {
    pub(crate) fn total_len(&self) -> usize {
        self.start_len + self.body_len + self.end_len
    }
}

pub(crate) fn try_parse_why_no_spec(text: &str) -> Option<WhyNoSpecMatch> {
    let start = WHY_NO_SPEC_START.find(text)?;
    let end = WHY_NO_SPEC_END.find(&text[start.end()..])?;
    Some(WhyNoSpecMatch {
        start_len: start.end(),
        body_len: end.start(),
        end_len: end.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_arg_quoted() {
        assert_eq!(macro_arg_len(r#""CSS3 Backgrounds", 'x')"#), 18);
        assert_eq!(macro_arg_len(r#"'it\'s')"#), 7);
    }

    #[test]
    fn test_macro_arg_bare_trims() {
        assert_eq!(macro_arg_len("1.9.2 , 2)"), 5);
        assert_eq!(macro_arg_len(")"), 0);
    }

    #[test]
    fn test_footnote_markers() {
        assert_eq!(try_parse_footnote_marker("[1] text"), Some(3));
        assert_eq!(try_parse_footnote_marker("[***]"), Some(5));
        assert_eq!(try_parse_footnote_marker("[a]"), None);
    }

    #[test]
    fn test_cell_version_with_engine() {
        assert_eq!(try_parse_cell_version("1.0 (1.9.2) rest"), Some(12));
        assert_eq!(try_parse_cell_version("18"), Some(2));
        assert_eq!(try_parse_cell_version("x18"), None);
    }

    #[test]
    fn test_padded_markers() {
        assert_eq!(try_parse_cell_noprefix(" (unprefixed) "), Some(14));
        assert_eq!(try_parse_cell_partial(", partial"), Some(9));
        assert_eq!(try_parse_cell_partial("partial"), None);
    }

    #[test]
    fn test_why_no_spec_block() {
        let text = "{{WhyNoSpecStart}}Not yet.{{ WhyNoSpecEnd }}</p>";
        let m = try_parse_why_no_spec(text).unwrap();
        assert_eq!(m.start_len, 18);
        assert_eq!(m.body_len, 8);
        assert_eq!(&text[m.total_len()..], "</p>");
    }

    #[test]
    fn test_why_no_spec_requires_end() {
        assert_eq!(try_parse_why_no_spec("{{WhyNoSpecStart}} dangling"), None);
    }
}
