//! KumaScript macros: `{{Name(args)}}` calls embedded in wiki markup.
//!
//! Each known macro name maps to a [`MacroDef`] in the catalog. A [`Macro`]
//! is validated when it is built (argument count, expected scope, and
//! per-kind checks such as Gecko version lookups), and the resulting issues
//! travel with it.

pub mod catalog;
pub mod versions;
pub mod xref;

use std::fmt;

use serde_json::{Map, Value, json};

pub use catalog::{MacroDef, MacroId, lookup};
pub use xref::XRef;

use crate::html::{Scope, Span};
use crate::issues::{Issue, IssueKind};
use versions::FxOsVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BugTracker {
    Mozilla,
    WebKit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeckoTarget {
    Desktop,
    FirefoxOs,
    Mobile,
}

/// Feature status flags set by the `*_inline` macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFlag {
    Experimental,
    NonStandard,
    Obsolete,
}

/// What a macro means, with the fields its kind needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroKind {
    Unknown,
    Bug {
        tracker: BugTracker,
        number: String,
    },
    /// A browser version from `CompatChrome`, `CompatIE` and friends.
    CompatVersion {
        version: String,
    },
    CompatGecko {
        target: GeckoTarget,
        gecko_version: String,
        version: Option<String>,
    },
    CompatNightly,
    CompatNo,
    CompatUnknown,
    CompatVersionUnknown,
    CompatibilityTable,
    EmbedCompatTable {
        slug: String,
    },
    GeckoRelease {
        release: String,
    },
    HtmlElement {
        element: String,
    },
    XRef(XRef),
    Status(StatusFlag),
    PropertyPrefix {
        prefix: String,
    },
    Spec2 {
        key: String,
    },
    SpecName {
        key: String,
        subpath: String,
        section_name: String,
    },
    CssBox,
    WhyNoSpec {
        body: String,
    },
}

/// One macro call.
#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    span: Span,
    raw: String,
    name: String,
    args: Vec<String>,
    scope: Scope,
    def: Option<&'static MacroDef>,
    kind: MacroKind,
    issues: Vec<Issue>,
}

impl Macro {
    pub fn new(
        name: &str,
        args: Vec<String>,
        span: Span,
        raw: impl Into<String>,
        scope: Scope,
    ) -> Self {
        let def = lookup(name);
        let mut mac = Macro {
            span,
            raw: raw.into(),
            name: name.to_string(),
            args,
            scope,
            def,
            kind: MacroKind::Unknown,
            issues: Vec::new(),
        };
        mac.kind = mac.classify();
        mac.validate();
        mac
    }

    /// A `{{WhyNoSpecStart}}...{{WhyNoSpecEnd}}` block.
    pub fn why_no_spec(body: String, span: Span, raw: impl Into<String>, scope: Scope) -> Self {
        let mut mac = Macro::new("WhyNoSpec", Vec::new(), span, raw, scope);
        mac.kind = MacroKind::WhyNoSpec { body };
        mac
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The name as written on the page.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Argument by position, empty when absent.
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map_or("", String::as_str)
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn kind(&self) -> &MacroKind {
        &self.kind
    }

    pub fn id(&self) -> Option<MacroId> {
        self.def.map(|d| d.id)
    }

    pub fn def(&self) -> Option<&'static MacroDef> {
        self.def
    }

    pub fn is_known(&self) -> bool {
        self.def.is_some()
    }

    /// Issues found while building the macro.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Arguments shared by every macro issue.
    pub fn issue_args(&self) -> Map<String, Value> {
        let mut args = Map::new();
        args.insert("name".into(), json!(self.name));
        args.insert("args".into(), json!(self.args));
        args.insert("scope".into(), json!(self.scope.as_str()));
        args.insert("kumascript".into(), json!(self.to_string()));
        args
    }

    /// Issue at this macro's span with the shared arguments plus `extra`.
    pub fn issue(&self, kind: IssueKind, extra: Value) -> Issue {
        let mut args = self.issue_args();
        if let Value::Object(extra) = extra {
            args.extend(extra);
        }
        Issue::at(kind, self.span, Value::Object(args))
    }

    fn classify(&self) -> MacroKind {
        let Some(def) = self.def else {
            return MacroKind::Unknown;
        };
        let first = self.arg(0).to_string();
        match def.id {
            MacroId::Bug => MacroKind::Bug {
                tracker: BugTracker::Mozilla,
                number: first,
            },
            MacroId::WebkitBug => MacroKind::Bug {
                tracker: BugTracker::WebKit,
                number: first,
            },
            MacroId::CompatAndroid
            | MacroId::CompatChrome
            | MacroId::CompatIe
            | MacroId::CompatOpera
            | MacroId::CompatOperaMobile
            | MacroId::CompatSafari => MacroKind::CompatVersion {
                version: versions::dotted(first.trim()),
            },
            MacroId::CompatGeckoDesktop => MacroKind::CompatGecko {
                target: GeckoTarget::Desktop,
                version: versions::gecko_desktop(&first),
                gecko_version: first,
            },
            MacroId::CompatGeckoMobile => MacroKind::CompatGecko {
                target: GeckoTarget::Mobile,
                version: versions::gecko_mobile(&first),
                gecko_version: first,
            },
            MacroId::CompatGeckoFxOs => {
                let override_version = self.args.get(1).map(String::as_str);
                let version = match versions::gecko_fxos(&first, override_version) {
                    FxOsVersion::Known(v) | FxOsVersion::BadOverride(v) => Some(v),
                    FxOsVersion::Unknown => None,
                };
                MacroKind::CompatGecko {
                    target: GeckoTarget::FirefoxOs,
                    gecko_version: first,
                    version,
                }
            }
            MacroId::CompatNightly => MacroKind::CompatNightly,
            MacroId::CompatNo => MacroKind::CompatNo,
            MacroId::CompatUnknown => MacroKind::CompatUnknown,
            MacroId::CompatVersionUnknown => MacroKind::CompatVersionUnknown,
            MacroId::CompatibilityTable => MacroKind::CompatibilityTable,
            MacroId::EmbedCompatTable => MacroKind::EmbedCompatTable { slug: first },
            MacroId::GeckoRelease => MacroKind::GeckoRelease { release: first },
            MacroId::HtmlElement => MacroKind::HtmlElement { element: first },
            MacroId::DeprecatedInline | MacroId::ObsoleteInline => {
                MacroKind::Status(StatusFlag::Obsolete)
            }
            MacroId::ExperimentalInline => MacroKind::Status(StatusFlag::Experimental),
            MacroId::NonStandardInline => MacroKind::Status(StatusFlag::NonStandard),
            MacroId::PropertyPrefix => MacroKind::PropertyPrefix { prefix: first },
            MacroId::Spec2 => MacroKind::Spec2 { key: first },
            MacroId::SpecName => MacroKind::SpecName {
                key: first,
                subpath: self.arg(1).to_string(),
                section_name: self.arg(2).to_string(),
            },
            MacroId::CssBox => MacroKind::CssBox,
            MacroId::WhyNoSpec => MacroKind::WhyNoSpec {
                body: String::new(),
            },
            id => match XRef::new(id, &self.args) {
                Some(xref) => MacroKind::XRef(xref),
                None => MacroKind::Unknown,
            },
        }
    }

    fn validate(&mut self) {
        if self.scope == Scope::Page {
            return;
        }
        let Some(def) = self.def else {
            let issue = self.issue(IssueKind::UnknownKumascript, json!({}));
            self.issues.push(issue);
            return;
        };

        let count = self.args.len();
        if !def.accepts_count(count) {
            let issue = self.issue(
                IssueKind::KumascriptWrongArgs,
                json!({
                    "min": def.min_args,
                    "max": def.max_args,
                    "count": count,
                    "arg_names": def.plain_arg_names(),
                    "arg_spec": def.arg_spec(),
                    "arg_count": catalog::plural_args(count),
                }),
            );
            self.issues.push(issue);
        }

        if !def.expects(self.scope) {
            let issue = self.issue(
                IssueKind::UnexpectedKumascript,
                json!({"expected_scopes": def.expected_scopes()}),
            );
            self.issues.push(issue);
        }

        if let Some(issue) = self.version_issue() {
            self.issues.push(issue);
        }
    }

    fn version_issue(&self) -> Option<Issue> {
        let MacroKind::CompatGecko {
            target,
            gecko_version,
            version,
        } = &self.kind
        else {
            return None;
        };
        if self.args.is_empty() {
            return None;
        }
        let kind = match (target, version) {
            (GeckoTarget::Desktop, None) => IssueKind::CompatGeckoDesktopUnknown,
            (GeckoTarget::Mobile, None) => IssueKind::CompatGeckoMobileUnknown,
            (GeckoTarget::FirefoxOs, None) => IssueKind::CompatGeckoFxOsUnknown,
            (GeckoTarget::FirefoxOs, Some(_)) => {
                let override_version = self.args.get(1)?;
                return match versions::gecko_fxos(gecko_version, Some(override_version)) {
                    FxOsVersion::BadOverride(_) => Some(self.issue(
                        IssueKind::CompatGeckoFxOsOverride,
                        json!({"override": override_version, "version": gecko_version}),
                    )),
                    _ => None,
                };
            }
            _ => return None,
        };
        Some(self.issue(kind, json!({"version": gecko_version})))
    }

    /// The browser version this macro asserts, for support cells.
    pub fn version(&self) -> Option<&str> {
        match &self.kind {
            MacroKind::CompatVersion { version } => Some(version),
            MacroKind::CompatGecko { version, .. } => version.as_deref(),
            _ => None,
        }
    }

    pub fn to_html(&self) -> String {
        match &self.kind {
            MacroKind::Bug { tracker, number } => {
                let number = number.trim();
                match tracker {
                    BugTracker::Mozilla => format!(
                        "<a href=\"https://bugzilla.mozilla.org/show_bug.cgi?id={number}\">\
                         bug {number}</a>"
                    ),
                    BugTracker::WebKit => format!(
                        "<a href=\"https://bugs.webkit.org/show_bug.cgi?id={number}\">\
                         WebKit bug {number}</a>"
                    ),
                }
            }
            MacroKind::CompatVersion { version } => version.clone(),
            MacroKind::CompatGecko { version, .. } => version.clone().unwrap_or_default(),
            MacroKind::GeckoRelease { release } => versions::gecko_release(release),
            MacroKind::HtmlElement { element } => {
                if element.contains(' ') {
                    format!("<code>{element}</code>")
                } else {
                    format!("<code>&lt;{element}&gt;</code>")
                }
            }
            MacroKind::XRef(xref) => xref.to_html(self.scope),
            MacroKind::Spec2 { key } | MacroKind::SpecName { key, .. } => {
                if key.is_empty() {
                    "specification (None)".to_string()
                } else {
                    format!("specification {key}")
                }
            }
            MacroKind::Unknown
            | MacroKind::CompatNightly
            | MacroKind::CompatNo
            | MacroKind::CompatUnknown
            | MacroKind::CompatVersionUnknown
            | MacroKind::CompatibilityTable
            | MacroKind::EmbedCompatTable { .. }
            | MacroKind::Status(_)
            | MacroKind::PropertyPrefix { .. }
            | MacroKind::CssBox
            | MacroKind::WhyNoSpec { .. } => String::new(),
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return write!(f, "{{{{{}}}}}", self.name);
        }
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| {
                if a.contains('"') {
                    format!("'{a}'")
                } else {
                    format!("\"{a}\"")
                }
            })
            .collect();
        write!(f, "{{{{{}({})}}}}", self.name, args.join(", "))
    }
}

/// Strip quotes from a raw macro argument or attribute value and undo
/// backslash escapes. Bare text is trimmed.
pub fn unquote_arg(raw: &str) -> String {
    let raw = raw.trim();
    let quote = match raw.chars().next() {
        Some(q @ ('"' | '\'')) if raw.len() >= 2 && raw.ends_with(q) => q,
        _ => return raw.to_string(),
    };
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(next) = chars.next()
        {
            if next != quote && next != '\\' {
                out.push('\\');
            }
            out.push(next);
        } else {
            out.push(c);
        }
    }
    out
}
