//! Parsing-expression grammar for raw wiki markup.
//!
//! One shared base grammar covers the allow-listed HTML subset, tag
//! attributes and text runs. Contexts differ only in the ordered list of
//! "extra" text tokens tried before a plain text run, so each specialized
//! grammar is a plain [`Grammar`] value.

mod parser;
pub(crate) mod tokens;

use std::fmt;

use crate::syntax::SyntaxNode;

/// A text token that a grammar context recognizes inside text runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextToken {
    /// `{{Name(args)}}`, including the `WhyNoSpecStart`/`WhyNoSpecEnd` block.
    Macro,
    /// `1.0`, `18 (18)` version numbers in a support cell.
    CellVersion,
    /// `[1]` or `[*]` footnote markers.
    Footnote,
    /// `Removed in`
    CellRemoved,
    /// `(unprefixed)` and friends.
    CellNoPrefix,
    /// `(partial)` or `, partial`.
    CellPartial,
}

/// A grammar context: the shared HTML grammar plus extra text tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grammar {
    name: &'static str,
    tokens: &'static [TextToken],
}

impl Grammar {
    /// Plain HTML, no macros.
    pub const HTML: Grammar = Grammar {
        name: "html",
        tokens: &[],
    };

    /// HTML with macros; used for whole pages and specification cells.
    pub const KUMASCRIPT: Grammar = Grammar {
        name: "kumascript",
        tokens: &[TextToken::Macro],
    };

    /// First column of a compatibility table.
    pub const COMPAT_FEATURE: Grammar = Grammar {
        name: "compat feature",
        tokens: &[TextToken::Macro, TextToken::Footnote],
    };

    /// Browser support cells of a compatibility table.
    pub const COMPAT_SUPPORT: Grammar = Grammar {
        name: "compat support",
        tokens: &[
            TextToken::Macro,
            TextToken::CellVersion,
            TextToken::Footnote,
            TextToken::CellRemoved,
            TextToken::CellNoPrefix,
            TextToken::CellPartial,
        ],
    };

    /// Footnote paragraphs after the compatibility tables.
    pub const COMPAT_FOOTNOTE: Grammar = Grammar {
        name: "compat footnote",
        tokens: &[TextToken::Macro, TextToken::Footnote],
    };

    /// Build a custom context from an ordered token list.
    pub const fn with_tokens(name: &'static str, tokens: &'static [TextToken]) -> Self {
        Grammar { name, tokens }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tokens(&self) -> &'static [TextToken] {
        self.tokens
    }

    pub fn recognizes(&self, token: TextToken) -> bool {
        self.tokens.contains(&token)
    }

    /// Look up a context by name, as used on the command line.
    pub fn by_name(name: &str) -> Option<Grammar> {
        [
            Grammar::HTML,
            Grammar::KUMASCRIPT,
            Grammar::COMPAT_FEATURE,
            Grammar::COMPAT_SUPPORT,
            Grammar::COMPAT_FOOTNOTE,
        ]
        .into_iter()
        .find(|g| g.name == name || g.name.split(' ').next_back() == Some(name))
    }

    /// Parse a whole document.
    ///
    /// The whole input must match; otherwise the error reports the first
    /// offset that could not be consumed.
    pub fn parse(&self, text: &str) -> Result<SyntaxNode, ParseError> {
        let green = parser::Parser::new(text, *self).parse()?;
        Ok(SyntaxNode::new_root(green))
    }
}

/// The grammar matched only a prefix of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// First byte offset that could not be consumed.
    pub pos: usize,
    /// Farthest offset any rule reached before failing.
    pub farthest: usize,
    /// What was expected at `farthest`.
    pub expected: Vec<&'static str>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to parse markup at offset {}", self.pos)?;
        if !self.expected.is_empty() {
            write!(
                f,
                " (expected {} at offset {})",
                self.expected.join(" or "),
                self.farthest
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}
