//! Cross-reference macros that link to other MDN pages.

use super::catalog::MacroId;
use crate::html::Scope;

pub const MDN_DOCS: &str = "https://developer.mozilla.org/en-US/docs/";

/// A resolved cross reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRef {
    pub id: MacroId,
    /// Path under [`MDN_DOCS`], possibly with an anchor.
    pub path: String,
    /// HTML shown inside the `<code>` wrapper.
    pub display: String,
}

fn arg(args: &[String], index: usize) -> &str {
    args.get(index).map_or("", |a| a.as_str())
}

/// First non-empty of the display argument and the fallback.
fn display_or<'a>(args: &'a [String], index: usize, fallback: &'a str) -> &'a str {
    Some(arg(args, index))
        .filter(|d| !d.is_empty())
        .unwrap_or(fallback)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `window.alert()` to `Window/alert`.
fn dom_path(api: &str) -> String {
    let api = api.replace(' ', "_").replace("()", "");
    let path = match api.split_once('.') {
        Some((interface, member)) => format!("{interface}/{member}"),
        None => api,
    };
    capitalize(&path)
}

/// `Array.prototype.lastIndexOf` to `Array/lastIndexOf`.
fn js_path(api: &str) -> String {
    let api = api.strip_prefix("Global_Objects/").unwrap_or(api);
    api.replace("()", "")
        .replace(".prototype.", "/")
        .replace('.', "/")
}

impl XRef {
    /// Build the reference for an xref macro, or `None` for other macros.
    pub fn new(id: MacroId, args: &[String]) -> Option<XRef> {
        let first = arg(args, 0);
        let (path, display) = match id {
            MacroId::CssXref => (format!("Web/CSS/{first}"), display_or(args, 1, first).to_string()),
            MacroId::DomXref => (
                format!("Web/API/{}", dom_path(first)),
                display_or(args, 1, first).to_string(),
            ),
            MacroId::JsXref => (
                format!("Web/JavaScript/Reference/Global_Objects/{}", js_path(first)),
                display_or(args, 1, first).to_string(),
            ),
            MacroId::DomEventXref => (
                format!("DOM/DOM_event_reference/{first}"),
                first.to_string(),
            ),
            MacroId::EventXref => (
                format!("Web/Events/{first}"),
                display_or(args, 1, first).to_string(),
            ),
            MacroId::ExceptionXref => (
                format!("Web/API/DOMException#{first}"),
                first.to_string(),
            ),
            MacroId::HtmlAttrXref => {
                let element = arg(args, 1);
                let path = if element.is_empty() {
                    format!("Web/HTML/Global_attributes#attr-{first}")
                } else {
                    format!("Web/HTML/Element/{element}#attr-{first}")
                };
                (path, display_or(args, 2, first).to_string())
            }
            MacroId::CssLength => css_value("length", "length"),
            MacroId::CssPercentage => css_value("percentage", "percentage"),
            MacroId::CssString => css_value("string", "string"),
            MacroId::CssImage => css_value("image", "image"),
            MacroId::CssColorValue => css_value("color_value", "color"),
            MacroId::CssVisual => css_value("Media/Visual", "visual"),
            _ => return None,
        };
        Some(XRef { id, path, display })
    }

    pub fn url(&self) -> String {
        format!("{MDN_DOCS}{}", self.path)
    }

    /// Feature names never link, and CSS references in specification
    /// descriptions stay plain too.
    pub fn is_linked(&self, scope: Scope) -> bool {
        match scope {
            Scope::CompatibilityFeature => false,
            Scope::SpecificationDescription => self.id != MacroId::CssXref,
            _ => true,
        }
    }

    pub fn to_html(&self, scope: Scope) -> String {
        if self.is_linked(scope) {
            format!("<a href=\"{}\"><code>{}</code></a>", self.url(), self.display)
        } else {
            format!("<code>{}</code>", self.display)
        }
    }
}

fn css_value(slug: &str, name: &str) -> (String, String) {
    (format!("Web/CSS/{slug}"), format!("&lt;{name}&gt;"))
}
