//! Registry of the macros the scraper understands.

use crate::html::Scope;

/// Discriminant of a known macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroId {
    Bug,
    WebkitBug,
    CompatAndroid,
    CompatChrome,
    CompatIe,
    CompatOpera,
    CompatOperaMobile,
    CompatSafari,
    CompatGeckoDesktop,
    CompatGeckoFxOs,
    CompatGeckoMobile,
    CompatNightly,
    CompatNo,
    CompatUnknown,
    CompatVersionUnknown,
    CompatibilityTable,
    EmbedCompatTable,
    GeckoRelease,
    HtmlElement,
    CssXref,
    DomXref,
    JsXref,
    DomEventXref,
    EventXref,
    ExceptionXref,
    HtmlAttrXref,
    CssLength,
    CssPercentage,
    CssString,
    CssImage,
    CssColorValue,
    CssVisual,
    DeprecatedInline,
    ExperimentalInline,
    NonStandardInline,
    ObsoleteInline,
    PropertyPrefix,
    Spec2,
    SpecName,
    CssBox,
    WhyNoSpec,
}

/// Static description of a known macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroDef {
    pub id: MacroId,
    /// Canonical spelling.
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    /// Argument names; optional ones are bracketed.
    pub arg_names: &'static [&'static str],
    pub scopes: &'static [Scope],
}

const FEATURE: Scope = Scope::CompatibilityFeature;
const SUPPORT: Scope = Scope::CompatibilitySupport;
const FOOTNOTE: Scope = Scope::Footnote;
const NAME: Scope = Scope::SpecificationName;
const MATURITY: Scope = Scope::SpecificationMaturity;
const DESCRIPTION: Scope = Scope::SpecificationDescription;
const PAGE: Scope = Scope::Page;

const PROSE: &[Scope] = &[FEATURE, FOOTNOTE, DESCRIPTION];
const CELL: &[Scope] = &[SUPPORT];

const fn def(
    id: MacroId,
    name: &'static str,
    min_args: usize,
    max_args: usize,
    arg_names: &'static [&'static str],
    scopes: &'static [Scope],
) -> MacroDef {
    MacroDef {
        id,
        name,
        min_args,
        max_args,
        arg_names,
        scopes,
    }
}

use MacroId::*;

pub const CATALOG: &[MacroDef] = &[
    def(Bug, "Bug", 1, 1, &["number"], &[FOOTNOTE]),
    def(WebkitBug, "WebkitBug", 1, 1, &["number"], &[FOOTNOTE]),
    def(CompatAndroid, "CompatAndroid", 1, 1, &["AndroidVersion"], CELL),
    def(CompatChrome, "CompatChrome", 1, 1, &["ChromeVer"], CELL),
    def(CompatIe, "CompatIE", 1, 1, &["IEver"], CELL),
    def(CompatOpera, "CompatOpera", 1, 1, &["OperaVer"], CELL),
    def(CompatOperaMobile, "CompatOperaMobile", 1, 1, &["OperaVer"], CELL),
    def(CompatSafari, "CompatSafari", 1, 1, &["SafariVer"], CELL),
    def(CompatGeckoDesktop, "CompatGeckoDesktop", 1, 1, &["GeckoVersion"], CELL),
    def(
        CompatGeckoFxOs,
        "CompatGeckoFxOS",
        1,
        2,
        &["GeckoVersion", "[VersionOverride]"],
        CELL,
    ),
    def(CompatGeckoMobile, "CompatGeckoMobile", 1, 1, &["GeckoVersion"], CELL),
    def(CompatNightly, "CompatNightly", 0, 1, &["[browser]"], CELL),
    def(CompatNo, "CompatNo", 0, 0, &[], CELL),
    def(CompatUnknown, "CompatUnknown", 0, 0, &[], CELL),
    def(CompatVersionUnknown, "CompatVersionUnknown", 0, 0, &[], CELL),
    def(CompatibilityTable, "CompatibilityTable", 0, 0, &[], &[PAGE]),
    def(EmbedCompatTable, "EmbedCompatTable", 1, 1, &["slug"], &[PAGE]),
    def(GeckoRelease, "geckoRelease", 1, 1, &["release"], &[FOOTNOTE]),
    def(
        HtmlElement,
        "HTMLElement",
        1,
        3,
        &["ElemName", "[LinkText]", "[Anchor]"],
        PROSE,
    ),
    def(
        CssXref,
        "cssxref",
        1,
        3,
        &["APIName", "[DisplayName]", "[Anchor]"],
        PROSE,
    ),
    def(
        DomXref,
        "domxref",
        1,
        4,
        &["DOMPath", "[DisplayName]", "[Anchor]", "[DontWrapInCode]"],
        PROSE,
    ),
    def(
        JsXref,
        "jsxref",
        1,
        4,
        &["APIName", "[DisplayName]", "[Anchor]", "[DontWrapInCode]"],
        PROSE,
    ),
    def(DomEventXref, "domeventxref", 1, 1, &["EventName"], PROSE),
    def(EventXref, "event", 1, 2, &["EventName", "[DisplayName]"], PROSE),
    def(ExceptionXref, "exception", 1, 1, &["ExceptionName"], PROSE),
    def(
        HtmlAttrXref,
        "htmlattrxref",
        1,
        3,
        &["AttributeName", "[ElementName]", "[DisplayName]"],
        PROSE,
    ),
    def(CssLength, "xref_csslength", 0, 0, &[], PROSE),
    def(CssPercentage, "xref_csspercentage", 0, 0, &[], PROSE),
    def(CssString, "xref_cssstring", 0, 0, &[], PROSE),
    def(CssImage, "xref_cssimage", 0, 0, &[], PROSE),
    def(CssColorValue, "xref_csscolorvalue", 0, 0, &[], PROSE),
    def(CssVisual, "xref_cssvisual", 0, 0, &[], PROSE),
    def(DeprecatedInline, "deprecated_inline", 0, 0, &[], PROSE),
    def(ExperimentalInline, "experimental_inline", 0, 0, &[], PROSE),
    def(NonStandardInline, "non-standard_inline", 0, 0, &[], PROSE),
    def(NonStandardInline, "not_standard_inline", 0, 0, &[], PROSE),
    def(ObsoleteInline, "obsolete_inline", 0, 0, &[], PROSE),
    def(PropertyPrefix, "property_prefix", 1, 1, &["Prefix"], CELL),
    def(Spec2, "Spec2", 1, 1, &["SpecKey"], &[MATURITY, DESCRIPTION]),
    def(
        SpecName,
        "SpecName",
        1,
        3,
        &["SpecKey", "Anchor", "[AnchorName]"],
        &[NAME, MATURITY, DESCRIPTION],
    ),
    def(CssBox, "cssbox", 1, 1, &["PropertyName"], &[PAGE]),
    def(WhyNoSpec, "WhyNoSpec", 0, 0, &[], &[PAGE]),
];

/// Find a macro by name, ignoring case.
pub fn lookup(name: &str) -> Option<&'static MacroDef> {
    CATALOG.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

impl MacroDef {
    pub fn expects(&self, scope: Scope) -> bool {
        scope == Scope::Page || self.scopes.contains(&scope)
    }

    pub fn accepts_count(&self, count: usize) -> bool {
        (self.min_args..=self.max_args).contains(&count)
    }

    /// Argument names without optional brackets.
    pub fn plain_arg_names(&self) -> Vec<&'static str> {
        self.arg_names
            .iter()
            .map(|n| n.trim_start_matches('[').trim_end_matches(']'))
            .collect()
    }

    /// `no arguments`, `exactly 1 argument (SpecKey)` or
    /// `between 1 and 3 arguments (SpecKey, Anchor, [AnchorName])`.
    pub fn arg_spec(&self) -> String {
        let names = self.arg_names.join(", ");
        if self.max_args == 0 {
            "no arguments".to_string()
        } else if self.min_args == self.max_args {
            format!("exactly {} ({})", plural_args(self.min_args), names)
        } else {
            format!(
                "between {} and {} arguments ({})",
                self.min_args, self.max_args, names
            )
        }
    }

    pub fn expected_scopes(&self) -> String {
        self.scopes
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `0 arguments`, `1 argument`, `2 arguments`.
pub fn plural_args(count: usize) -> String {
    if count == 1 {
        "1 argument".to_string()
    } else {
        format!("{count} arguments")
    }
}
