//! Typed node tree over the parsed markup.
//!
//! The grammar produces a lossless rowan tree. The [`visitor`] turns it into
//! [`Node`] values carrying absolute page offsets, cleaned text and the
//! issues found along the way. Attribute policies live in [`attributes`].

pub mod attributes;
mod nodes;
pub mod visitor;

use std::fmt;

use serde::Serialize;

pub use attributes::{Action, AttributeActions};
pub use nodes::{
    Attribute, AttributeValue, Attributes, CellMarker, CellVersion, CloseTag, Element, Footnote,
    Interval, MarkerKind, Node, OpenTag, Span, Text,
};
pub use visitor::{Fragment, parse_fragment, reparse_element};

/// The extraction context a fragment is interpreted in.
///
/// Macros declare which scopes they are expected in, and attribute
/// policies differ by scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum Scope {
    Page,
    SpecificationName,
    SpecificationMaturity,
    SpecificationDescription,
    CompatibilityFeature,
    CompatibilitySupport,
    Footnote,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Page => "page",
            Scope::SpecificationName => "specification name",
            Scope::SpecificationMaturity => "specification maturity",
            Scope::SpecificationDescription => "specification description",
            Scope::CompatibilityFeature => "compatibility feature",
            Scope::CompatibilitySupport => "compatibility support",
            Scope::Footnote => "footnote",
        }
    }
}

impl From<Scope> for &'static str {
    fn from(scope: Scope) -> Self {
        scope.as_str()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
