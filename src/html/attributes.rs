//! Per-tag attribute policies.

use serde_json::json;

use super::{Attributes, Interval, OpenTag, Scope};
use crate::issues::{Issue, IssueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep silently.
    Keep,
    /// Remove silently.
    Drop,
    /// Remove with an `unexpected_attribute` issue.
    Ban,
    /// Keep, and raise `missing_attribute` when absent.
    Must,
    /// Remove silently when the value starts with the prefix, else ban.
    DropPrefixed(&'static str),
}

/// Actions for named attributes, plus a default for the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeActions {
    default: Action,
    rules: Vec<(&'static str, Action)>,
}

impl Default for AttributeActions {
    fn default() -> Self {
        Self::keep_all()
    }
}

impl AttributeActions {
    pub fn new(default: Action) -> Self {
        Self {
            default,
            rules: Vec::new(),
        }
    }

    pub fn keep_all() -> Self {
        Self::new(Action::Keep)
    }

    pub fn with(mut self, name: &'static str, action: Action) -> Self {
        self.rules.retain(|(n, _)| *n != name);
        self.rules.push((name, action));
        self
    }

    /// Links must have a target; titles and MDN's "external" classes are
    /// noise.
    pub fn link() -> Self {
        Self::new(Action::Ban)
            .with("href", Action::Must)
            .with("title", Action::Drop)
            .with("class", Action::DropPrefixed("external"))
    }

    /// Header cells of a compatibility table.
    pub fn table_header() -> Self {
        Self::new(Action::Ban).with("colspan", Action::Keep)
    }

    /// Body cells of a compatibility table.
    pub fn table_cell() -> Self {
        Self::new(Action::Ban)
            .with("rowspan", Action::Keep)
            .with("colspan", Action::Keep)
    }

    /// The policy for `tag` in `scope`.
    pub fn for_tag(scope: Scope, tag: &str) -> Self {
        match (scope, tag) {
            (Scope::Page, _) => Self::keep_all(),
            (_, "a") => Self::link(),
            (Scope::CompatibilityFeature | Scope::CompatibilitySupport, "td") => {
                Self::table_cell()
            }
            (Scope::CompatibilityFeature | Scope::CompatibilitySupport, "th") => {
                Self::table_header()
            }
            _ => Self::keep_all(),
        }
    }

    pub fn action(&self, name: &str) -> Action {
        self.rules
            .iter()
            .find(|(n, _)| *n == name)
            .map_or(self.default, |(_, action)| *action)
    }

    fn keeps_everything(&self) -> bool {
        self.default == Action::Keep && self.rules.iter().all(|(_, a)| *a == Action::Keep)
    }

    /// Human description of what is allowed, used in issue messages.
    fn expected(&self) -> String {
        let mut allowed: Vec<&str> = self
            .rules
            .iter()
            .filter(|(_, a)| matches!(a, Action::Keep | Action::Must))
            .map(|(n, _)| *n)
            .collect();
        allowed.sort_unstable();
        match allowed.as_slice() {
            [] => "no attributes".to_string(),
            [one] => format!("the attribute {one}"),
            [init @ .., last] => format!("the attributes {} or {}", init.join(", "), last),
        }
    }

    /// Apply the policy to a tag, returning the surviving attributes.
    ///
    /// Issues for banned attributes come first, in source order, then
    /// issues for missing required ones.
    pub fn validate(&self, open: &OpenTag) -> (Attributes, Vec<Issue>) {
        if self.keeps_everything() {
            return (open.attributes.clone(), Vec::new());
        }

        let mut kept = Attributes::new();
        let mut issues = Vec::new();
        for attr in open.attributes.iter() {
            let banned = match self.action(&attr.name) {
                Action::Keep | Action::Must => {
                    kept.insert(attr.clone());
                    false
                }
                Action::Drop => false,
                Action::Ban => true,
                Action::DropPrefixed(prefix) => !attr.value_str().starts_with(prefix),
            };
            if banned {
                issues.push(Issue::at(
                    IssueKind::UnexpectedAttribute,
                    attr.span(),
                    json!({
                        "node_type": open.tag,
                        "ident": attr.name,
                        "value": attr.value_str(),
                        "expected": self.expected(),
                    }),
                ));
            }
        }

        for (name, action) in &self.rules {
            if *action == Action::Must && !open.attributes.contains(name) {
                issues.push(Issue::at(
                    IssueKind::MissingAttribute,
                    open.span,
                    json!({"node_type": open.tag, "ident": name}),
                ));
            }
        }
        (kept, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{Attribute, AttributeValue, Span};

    fn open_tag(tag: &str, attrs: &[(&str, &str, usize)]) -> OpenTag {
        let mut attributes = Attributes::new();
        for (name, value, start) in attrs {
            let raw = format!("{name}=\"{value}\"");
            attributes.insert(Attribute {
                span: Span::new(*start, start + raw.len()),
                raw,
                name: name.to_string(),
                value: AttributeValue::Quoted(value.to_string()),
            });
        }
        OpenTag {
            span: Span::new(0, 20),
            raw: String::new(),
            tag: tag.to_string(),
            attributes,
        }
    }

    #[test]
    fn test_keep_all_is_untouched() {
        let tag = open_tag("td", &[("style", "color:red", 4)]);
        let (kept, issues) = AttributeActions::keep_all().validate(&tag);
        assert_eq!(kept, tag.attributes);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_missing_and_unexpected() {
        let tag = open_tag("a", &[("name", "bc1", 3)]);
        let (kept, issues) = AttributeActions::link().validate(&tag);
        assert!(kept.is_empty());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, IssueKind::UnexpectedAttribute);
        assert_eq!(issues[0].span(), Span::new(3, 13));
        assert_eq!(issues[0].args["expected"], "the attribute href");
        assert_eq!(issues[1].kind, IssueKind::MissingAttribute);
        assert_eq!(issues[1].span(), Span::new(0, 20));
    }

    #[test]
    fn test_external_class_dropped_silently() {
        let tag = open_tag(
            "a",
            &[("href", "https://x.test", 3), ("class", "external-icon", 24)],
        );
        let (kept, issues) = AttributeActions::link().validate(&tag);
        assert!(issues.is_empty());
        assert_eq!(kept.len(), 1);

        let tag = open_tag("a", &[("href", "https://x.test", 3), ("class", "link-https", 24)]);
        let (_, issues) = AttributeActions::link().validate(&tag);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].args["value"], "link-https");
    }

    #[test]
    fn test_expected_lists_allowed() {
        let tag = open_tag("td", &[("style", "x", 4)]);
        let (_, issues) = AttributeActions::table_cell().validate(&tag);
        assert_eq!(issues[0].args["expected"], "the attributes colspan or rowspan");

        let tag = open_tag("span", &[("style", "x", 4)]);
        let (_, issues) = AttributeActions::new(Action::Ban).validate(&tag);
        assert_eq!(issues[0].args["expected"], "no attributes");
    }

    #[test]
    fn test_two_musts_missing() {
        let tag = open_tag("a", &[("style", "x", 3)]);
        let actions = AttributeActions::new(Action::Drop)
            .with("external", Action::Must)
            .with("href", Action::Must)
            .with("style", Action::Ban);
        let (_, issues) = actions.validate(&tag);
        let kinds: Vec<_> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::UnexpectedAttribute,
                IssueKind::MissingAttribute,
                IssueKind::MissingAttribute
            ]
        );
        assert_eq!(issues[0].args["expected"], "the attributes external or href");
    }
}
