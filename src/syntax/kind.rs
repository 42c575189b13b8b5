//! Syntax kinds and language definition for the wiki markup CST.

use rowan::Language;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // Tokens
    WHITESPACE = 0,
    TEXT,
    RAW_TEXT, // content of <code> and <pre>, kept verbatim

    // Tag punctuation
    TAG_START,       // < or </
    TAG_END,         // >
    TAG_SELF_CLOSE,  // />
    TAG_NAME,        // p, td, h2 ...
    ATTRIBUTE_NAME,  // colspan
    EQUALS,          // =
    ATTRIBUTE_VALUE, // "2", '2' or 2

    // Macro punctuation
    MACRO_START, // {{
    MACRO_END,   // }}
    MACRO_NAME,  // CompatGeckoDesktop
    L_PAREN,     // (
    R_PAREN,     // )
    COMMA,       // ,
    MACRO_ARG,   // "1.9.2", 'a', or bare text
    MACRO_BODY,  // everything between WhyNoSpecStart and WhyNoSpecEnd

    // Context-specific text tokens
    FOOTNOTE_MARKER, // [1] or [*]
    CELL_VERSION,    // 1.0 (1.9.2)
    CELL_REMOVED,    // Removed in
    CELL_NOPREFIX,   // (unprefixed)
    CELL_PARTIAL,    // (partial)

    // Composite nodes
    DOCUMENT,
    ELEMENT,
    OPEN_TAG,
    CLOSE_TAG,
    ATTRIBUTE,
    MACRO,
    MACRO_ARGS,
    WHY_NO_SPEC,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::WHITESPACE)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkupLanguage {}

impl Language for MarkupLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::WHY_NO_SPEC as u16);
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<MarkupLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<MarkupLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<MarkupLanguage>;
