mod kind;

pub use kind::{MarkupLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
