use regex::Regex;
use std::sync::LazyLock;

/// Longest slug the resolution store accepts.
pub const SLUG_LENGTH: usize = 50;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\s|<\s*br\s*/?>|\x{a0}|&nbsp;)+").expect("whitespace regex is valid")
});

/// Collapse whitespace, `<br>` variants and non-breaking spaces into single
/// spaces, drop byte-order marks and trim the ends.
pub fn cleanup_whitespace(text: &str) -> String {
    let text = text.replace('\u{feff}', "");
    WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
}

/// Join rendered fragments with a single space where one is needed.
///
/// Empty fragments are skipped. No space is added after a fragment ending
/// in a space, or before one starting with punctuation or a space.
pub fn join_content<I, S>(bits: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    const NO_SPACE_BEFORE: &[char] = &['!', ',', '.', ';', '?', ' '];
    let mut out = String::new();
    for bit in bits {
        let bit = bit.as_ref();
        let Some(first) = bit.chars().next() else {
            continue;
        };
        if !out.is_empty() && !out.ends_with(' ') && !NO_SPACE_BEFORE.contains(&first) {
            out.push(' ');
        }
        out.push_str(bit);
    }
    out
}

/// Convert a name into a store slug.
///
/// A non-zero `suffix` is appended after truncation so that retries stay
/// within [`SLUG_LENGTH`].
pub fn slugify(word: &str, suffix: usize) -> String {
    let mut slug = String::with_capacity(word.len());
    for c in word.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' && slug.ends_with('_') {
            continue;
        }
        slug.push(c);
    }

    let suffix = if suffix == 0 {
        String::new()
    } else {
        suffix.to_string()
    };
    slug.truncate(SLUG_LENGTH.saturating_sub(suffix.len()));
    slug.push_str(&suffix);
    slug
}

/// Normalise a feature name for matching: lower-case, without `<code>`
/// wrappers or escaped angle brackets.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .replace("<code>", "")
        .replace("</code>", "")
        .replace("&lt;", "")
        .replace("&gt;", "")
}

/// Byte index of the first newline at or after `pos`, else the text length.
pub fn end_of_line(text: &str, pos: usize) -> usize {
    let pos = pos.min(text.len());
    text.as_bytes()[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(text.len(), |i| pos + i)
}
