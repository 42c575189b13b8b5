//! Diagnostics raised while scraping a page.
//!
//! Issues never abort extraction. Each one records its kind, the byte span
//! of the offending markup, and a map of arguments used to fill in the
//! kind's message templates.

mod kind;
mod render;

pub use kind::{IssueKind, Severity};
pub use render::{offset_to_line_col, render_issue, render_issue_plain, render_issues};

use serde::ser::{Serialize, SerializeTuple, Serializer};
use serde_json::{Map, Value};

use crate::html::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub kind: IssueKind,
    pub start: usize,
    pub end: usize,
    pub args: Map<String, Value>,
}

impl Issue {
    /// Create an issue. `args` should be a JSON object (or null for none).
    pub fn new(kind: IssueKind, start: usize, end: usize, args: Value) -> Self {
        debug_assert!(end >= start, "issue span {start}..{end} is reversed");
        let args = match args {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => panic!("issue arguments must be an object, got {other}"),
        };
        Self {
            kind,
            start,
            end,
            args,
        }
    }

    pub fn at(kind: IssueKind, span: Span, args: Value) -> Self {
        Self::new(kind, span.start, span.end, args)
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn slug(&self) -> &'static str {
        self.kind.slug()
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    pub fn brief(&self) -> String {
        format_template(self.kind.brief_template(), &self.args)
    }

    pub fn long(&self) -> String {
        format_template(self.kind.long_template(), &self.args)
    }
}

impl Serialize for Issue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.kind)?;
        tuple.serialize_element(&self.start)?;
        tuple.serialize_element(&self.end)?;
        tuple.serialize_element(&self.args)?;
        tuple.end()
    }
}

/// Fill `{name}` placeholders from `args`. `{{` and `}}` are literal braces.
///
/// String values are inserted bare, everything else as JSON. A placeholder
/// with no matching argument is left as is.
pub fn format_template(template: &str, args: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(i) = rest.find(['{', '}']) {
        out.push_str(&rest[..i]);
        let tail = &rest[i..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('{')
            && let Some(close) = tail.find('}')
        {
            let name = &tail[1..close];
            match args.get(name) {
                Some(Value::String(s)) => out.push_str(s),
                Some(other) => out.push_str(&other.to_string()),
                None => out.push_str(&tail[..=close]),
            }
            rest = &tail[close + 1..];
            continue;
        }
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}
