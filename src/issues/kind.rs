use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        })
    }
}

/// The closed vocabulary of issues found while scraping a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IssueKind {
    CellOutOfBounds,
    CompatGeckoDesktopUnknown,
    CompatGeckoFxOsOverride,
    CompatGeckoFxOsUnknown,
    CompatGeckoMobileUnknown,
    ExtraCell,
    FalseStart,
    FeatureHeader,
    FootnoteFeature,
    FootnoteGap,
    FootnoteIdCollision,
    FootnoteMissing,
    FootnoteMultiple,
    FootnoteNoId,
    FootnoteUnused,
    HaltImport,
    InlineText,
    KumascriptWrongArgs,
    MissingAttribute,
    NestedP,
    NoData,
    SecondFootnote,
    SkippedContent,
    SkippedH3,
    SpecH2Id,
    SpecH2Name,
    SpecMismatch,
    Spec2Converted,
    Spec2Omitted,
    Spec2WrongKumascript,
    SpecdescSpec2Invalid,
    SpecnameBlankKey,
    SpecnameConverted,
    SpecnameNotKumascript,
    SpecnameOmitted,
    TagDropped,
    UnexpectedAttribute,
    UnexpectedKumascript,
    UnknownBrowser,
    UnknownKumascript,
    UnknownSpec,
    UnknownVersion,
}

/// Slug, severity, brief template and long template of an issue kind.
struct Description {
    slug: &'static str,
    severity: Severity,
    brief: &'static str,
    long: &'static str,
}

const fn describe(
    slug: &'static str,
    severity: Severity,
    brief: &'static str,
    long: &'static str,
) -> Description {
    Description {
        slug,
        severity,
        brief,
        long,
    }
}

impl IssueKind {
    pub const ALL: &'static [IssueKind] = &[
        IssueKind::CellOutOfBounds,
        IssueKind::CompatGeckoDesktopUnknown,
        IssueKind::CompatGeckoFxOsOverride,
        IssueKind::CompatGeckoFxOsUnknown,
        IssueKind::CompatGeckoMobileUnknown,
        IssueKind::ExtraCell,
        IssueKind::FalseStart,
        IssueKind::FeatureHeader,
        IssueKind::FootnoteFeature,
        IssueKind::FootnoteGap,
        IssueKind::FootnoteIdCollision,
        IssueKind::FootnoteMissing,
        IssueKind::FootnoteMultiple,
        IssueKind::FootnoteNoId,
        IssueKind::FootnoteUnused,
        IssueKind::HaltImport,
        IssueKind::InlineText,
        IssueKind::KumascriptWrongArgs,
        IssueKind::MissingAttribute,
        IssueKind::NestedP,
        IssueKind::NoData,
        IssueKind::SecondFootnote,
        IssueKind::SkippedContent,
        IssueKind::SkippedH3,
        IssueKind::SpecH2Id,
        IssueKind::SpecH2Name,
        IssueKind::SpecMismatch,
        IssueKind::Spec2Converted,
        IssueKind::Spec2Omitted,
        IssueKind::Spec2WrongKumascript,
        IssueKind::SpecdescSpec2Invalid,
        IssueKind::SpecnameBlankKey,
        IssueKind::SpecnameConverted,
        IssueKind::SpecnameNotKumascript,
        IssueKind::SpecnameOmitted,
        IssueKind::TagDropped,
        IssueKind::UnexpectedAttribute,
        IssueKind::UnexpectedKumascript,
        IssueKind::UnknownBrowser,
        IssueKind::UnknownKumascript,
        IssueKind::UnknownSpec,
        IssueKind::UnknownVersion,
    ];

    fn description(self) -> Description {
        use Severity::*;
        match self {
            IssueKind::CellOutOfBounds => describe(
                "cell_out_of_bounds",
                Error,
                "Cell ranges outside of the compatibility table",
                "The cell expands past the bounds of the compatibility table. If it has a \
                 rowspan or colspan, in-bound cells will be applied.",
            ),
            IssueKind::CompatGeckoDesktopUnknown => describe(
                "compatgeckodesktop_unknown",
                Error,
                "Unknown Gecko version \"{version}\"",
                "The importer does not recognize this version for CompatGeckoDesktop. \
                 Change the MDN page or update the importer.",
            ),
            IssueKind::CompatGeckoFxOsOverride => describe(
                "compatgeckofxos_override",
                Error,
                "Override \"{override}\" is invalid for Gecko version \"{version}\".",
                "The importer does not recognize this override for CompatGeckoFxOS. \
                 Change the MDN page or update the importer.",
            ),
            IssueKind::CompatGeckoFxOsUnknown => describe(
                "compatgeckofxos_unknown",
                Error,
                "Unknown Gecko version \"{version}\"",
                "The importer does not recognize this version for CompatGeckoFxOS. \
                 Change the MDN page or update the importer.",
            ),
            IssueKind::CompatGeckoMobileUnknown => describe(
                "compatgeckomobile_unknown",
                Error,
                "Unknown Gecko version \"{version}\"",
                "The importer does not recognize this version for CompatGeckoMobile. \
                 Change the MDN page or update the importer.",
            ),
            IssueKind::ExtraCell => describe(
                "extra_cell",
                Error,
                "Extra cell in compatibility table row.",
                "A row in the compatibility table has more cells than the header row. It \
                 may be the cell identified in the context, a different cell in the row, or \
                 a missing header cell.",
            ),
            IssueKind::FalseStart => describe(
                "false_start",
                Critical,
                "No <h2> found in page.",
                "A compatibility table must be after a proper <h2> to be imported.",
            ),
            IssueKind::FeatureHeader => describe(
                "feature_header",
                Warning,
                "Expected first header to be \"Feature\"",
                "The first header is \"{header}\", not \"Feature\"",
            ),
            IssueKind::FootnoteFeature => describe(
                "footnote_feature",
                Error,
                "Footnotes are not allowed on features",
                "The Feature model does not include a notes field. Remove the footnote from \
                 the feature.",
            ),
            IssueKind::FootnoteGap => describe(
                "footnote_gap",
                Error,
                "There are unexpected elements in the footnote section",
                "The footnotes parser expects only <p> and <pre> sections in the footnotes. \
                 Check for incorrect <div> wrapping and other issues.",
            ),
            IssueKind::FootnoteIdCollision => describe(
                "footnote_id_collision",
                Warning,
                "Footnote {marker} reuses the ID of footnote {previous_marker}",
                "Both footnotes map to ID \"{footnote_id}\" (asterisk footnotes count their \
                 asterisks), so only the first is kept. Renumber one of the footnotes.",
            ),
            IssueKind::FootnoteMissing => describe(
                "footnote_missing",
                Error,
                "Footnote [{footnote_id}] not found.",
                "The compatibility table has a reference to footnote \"{footnote_id}\", but \
                 no matching footnote was found. This may be due to parse issues in the \
                 footnotes section, a typo in the MDN page, or a footnote that was removed \
                 without removing the footnote reference from the table.",
            ),
            IssueKind::FootnoteMultiple => describe(
                "footnote_multiple",
                Error,
                "Only one footnote allowed per compatibility cell.",
                "The API supports only one footnote per support assertion. Combine footnotes \
                 [{prev_footnote_id}] and [{footnote_id}], or remove one of them.",
            ),
            IssueKind::FootnoteNoId => describe(
                "footnote_no_id",
                Error,
                "Footnote has no ID.",
                "Footnote references, such as [1], are used to link the footnote to the \
                 support assertion in the compatibility table. Reformat the MDN page to use \
                 footnote references.",
            ),
            IssueKind::FootnoteUnused => describe(
                "footnote_unused",
                Error,
                "Footnote [{footnote_id}] is unused.",
                "No cells in the compatibility table included the footnote reference \
                 [{footnote_id}]. This could be due to a issue importing the compatibility \
                 cell, a typo on the MDN page, or an extra footnote that should be removed \
                 from the MDN page.",
            ),
            IssueKind::HaltImport => describe(
                "halt_import",
                Critical,
                "Unable to finish importing MDN page.",
                "The importer was unable to finish parsing the MDN page. This may be due to \
                 an unknown HTML tag, nested <code> or <pre> elements, or other unexpected \
                 content.",
            ),
            IssueKind::InlineText => describe(
                "inline_text",
                Error,
                "Unknown inline support text \"{text}\".",
                "The API schema does not include inline notes. This text needs to be \
                 converted to a footnote, converted to a support attribute (which may \
                 require an importer update), or removed.",
            ),
            IssueKind::KumascriptWrongArgs => describe(
                "kumascript_wrong_args",
                Error,
                "Bad argument count in KumaScript {kumascript} in {scope}.",
                "The importer expected {name} to have {arg_spec}, but it had {arg_count}",
            ),
            IssueKind::MissingAttribute => describe(
                "missing_attribute",
                Error,
                "The tag <{node_type}> is missing the expected attribute {ident}",
                "Add the missing attribute or convert the tag to plain text.",
            ),
            IssueKind::NestedP => describe(
                "nested_p",
                Error,
                "Nested <p> tags are not supported.",
                "Edit the MDN page to remove the nested <p> tag",
            ),
            IssueKind::NoData => describe(
                "no_data",
                Critical,
                "No data was extracted from the page.",
                "The page appears to have data, but nothing was extracted. Check for header \
                 sections wrapped in a <div> or other element. (Context will probably not \
                 highlight the issue)",
            ),
            IssueKind::SecondFootnote => describe(
                "second_footnote",
                Error,
                "An additional footnote was detected in content",
                "The footnote [{original}] is being used, and the footnote [{new}] \
                 discarded.  If footnotes are in the same <p> and split by <br> tags, then \
                 split into paragraphs to fix.",
            ),
            IssueKind::SkippedContent => describe(
                "skipped_content",
                Warning,
                "Content will not be imported.",
                "This content will not be imported into the API.",
            ),
            IssueKind::SkippedH3 => describe(
                "skipped_h3",
                Warning,
                "<h3>{h3}</h3> was not imported.",
                "<h3> subsections are usually prose compatibility information, and anything \
                 after an <h3> is not parsed or imported. Convert to footnotes or move to a \
                 different <h2> section.",
            ),
            IssueKind::SpecH2Id => describe(
                "spec_h2_id",
                Warning,
                "Expected <h2 id=\"Specifications\">, actual id={h2_id}",
                "Fix the id so that the table of contents, other feature work.",
            ),
            IssueKind::SpecH2Name => describe(
                "spec_h2_name",
                Warning,
                "Expected <h2 name=\"Specifications\">, actual name={h2_name}",
                "Fix or remove the name attribute.",
            ),
            IssueKind::SpecMismatch => describe(
                "spec_mismatch",
                Error,
                "SpecName({specname_key}, ...) does not match Spec2({spec2_key}).",
                "SpecName and Spec2 must refer to the same mdn_key. Update the MDN page.",
            ),
            IssueKind::Spec2Converted => describe(
                "spec2_converted",
                Warning,
                "Specification status should be converted to KumaScript",
                "Expected KumaScript {{{{Spec2(\"{key}\")}}}}, but got text \"{original}\".",
            ),
            IssueKind::Spec2Omitted => describe(
                "spec2_omitted",
                Warning,
                "Expected KumaScript Spec2(), got nothing",
                "Change to Spec2(mdn_key), using the mdn_key from the SpecName() \
                 KumaScript, or remove empty table row.",
            ),
            IssueKind::Spec2WrongKumascript => describe(
                "spec2_wrong_kumascript",
                Error,
                "Expected KumaScript Spec2(), got {kumascript}",
                "Change to Spec2(mdn_key), using the mdn_key from the SpecName() \
                 KumaScript.",
            ),
            IssueKind::SpecdescSpec2Invalid => describe(
                "specdesc_spec2_invalid",
                Error,
                "{kumascript} is invalid in the spec description",
                "Handled as if {{{{SpecName(...)}}}} was used. Update the MDN page.",
            ),
            IssueKind::SpecnameBlankKey => describe(
                "specname_blank_key",
                Error,
                "KumaScript SpecName has a blank key",
                "Update the MDN page to include a valid mdn_key",
            ),
            IssueKind::SpecnameConverted => describe(
                "specname_converted",
                Warning,
                "Specification name should be converted to KumaScript",
                "The specification \"{original}\" should be replaced with the KumaScript \
                 {{{{SpecName({key})}}}}",
            ),
            IssueKind::SpecnameNotKumascript => describe(
                "specname_not_kumascript",
                Error,
                "Specification name unknown, and should be converted to KumaScript",
                "Expected KumaScript {{{{SpecName(key, subpath, name)}}}}, but got text \
                 \"{original}\".",
            ),
            IssueKind::SpecnameOmitted => describe(
                "specname_omitted",
                Warning,
                "Expected KumaScript SpecName(), got nothing",
                "Expected KumaScript {{{{SpecName(key, subpath, name)}}}}, but got no text. Fix \
                 or remove empty table row.",
            ),
            IssueKind::TagDropped => describe(
                "tag_dropped",
                Warning,
                "HTML element {tag} (but not wrapped content) was removed.",
                "The element {tag} is not allowed in the {scope} scope, and was removed. You \
                 can remove the tag from the MDN page to remove the warning.",
            ),
            IssueKind::UnexpectedAttribute => describe(
                "unexpected_attribute",
                Warning,
                "Unexpected attribute <{node_type} {ident}=\"{value}\">",
                "For <{node_type}>, the importer expects {expected}. This unexpected \
                 attribute will be discarded.",
            ),
            IssueKind::UnexpectedKumascript => describe(
                "unexpected_kumascript",
                Error,
                "KumaScript {kumascript} was not expected in {scope}.",
                "The KumaScript {name} appears in a {scope}, but is only expected in \
                 {expected_scopes}. File a bug, or convert the MDN page to not use this \
                 KumaScript macro here.",
            ),
            IssueKind::UnknownBrowser => describe(
                "unknown_browser",
                Error,
                "Unknown Browser \"{name}\".",
                "The API does not have a browser with the name \"{name}\". This could be a \
                 typo on the MDN page, or the browser needs to be added to the API.",
            ),
            IssueKind::UnknownKumascript => describe(
                "unknown_kumascript",
                Error,
                "Unknown KumaScript {kumascript} in {scope}.",
                "The importer has to run custom code to import KumaScript, and it hasn't \
                 been taught how to import {name} when it appears in a {scope}. File a bug, \
                 or convert the MDN page to not use this KumaScript macro.",
            ),
            IssueKind::UnknownSpec => describe(
                "unknown_spec",
                Error,
                "Unknown Specification \"{key}\".",
                "The API does not have a specification with mdn_key \"{key}\". This could \
                 be a typo on the MDN page, or the specification needs to be added to the \
                 API.",
            ),
            IssueKind::UnknownVersion => describe(
                "unknown_version",
                Error,
                "Unknown version \"{version}\" for browser \"{browser_name}\"",
                "The API does not have the version \"{version}\" for browser \
                 \"{browser_name}\" (id {browser_id}, slug \"{browser_slug}\"). This could be \
                 a typo on the MDN page, or the version needs to be added to the API.",
            ),
        }
    }

    pub fn slug(self) -> &'static str {
        self.description().slug
    }

    pub fn severity(self) -> Severity {
        self.description().severity
    }

    pub fn brief_template(self) -> &'static str {
        self.description().brief
    }

    pub fn long_template(self) -> &'static str {
        self.description().long
    }

    pub fn from_slug(slug: &str) -> Option<IssueKind> {
        Self::ALL.iter().copied().find(|kind| kind.slug() == slug)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl Serialize for IssueKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}
