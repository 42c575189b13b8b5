//! Browser version tables for the `Compat*` and `geckoRelease` macros.

/// Gecko engine versions before Firefox 5, mapped to Firefox versions.
const GECKO_DESKTOP: &[(&str, &str)] = &[
    ("1", "1.0"),
    ("1.0", "1.0"),
    ("1.7", "1.0"),
    ("1.8", "1.5"),
    ("1.8.1", "2.0"),
    ("1.9", "3.0"),
    ("1.9.1", "3.5"),
    ("1.9.1.4", "3.5.4"),
    ("1.9.2", "3.6"),
    ("1.9.2.4", "3.6.4"),
    ("1.9.2.5", "3.6.5"),
    ("1.9.2.9", "3.6.9"),
    ("2", "4.0"),
    ("2.0", "4.0"),
];

/// Firefox OS releases by the last Gecko version they shipped with.
const GECKO_FXOS: &[(u32, &str)] = &[
    (18, "1.0"),
    (26, "1.2"),
    (28, "1.3"),
    (30, "1.4"),
    (32, "2.0"),
    (34, "2.1"),
    (37, "2.2"),
    (44, "2.5"),
];

/// Override versions allowed for Firefox OS 1.0.
const FXOS_OVERRIDES: &[&str] = &["1.0.1", "1.1"];

/// Firefox OS releases first built on a Gecko version.
const FXOS_RELEASES: &[(u32, &[&str])] = &[
    (18, &["1.0.1", "1.1"]),
    (26, &["1.2"]),
    (28, &["1.3"]),
    (30, &["1.4"]),
    (32, &["2.0"]),
    (34, &["2.1"]),
    (37, &["2.2"]),
    (44, &["2.5"]),
];

/// Product lines of Gecko releases before the rapid release cycle.
const EARLY_RELEASES: &[(&str, &str)] = &[
    ("1.8", "Firefox 1.5 / Thunderbird 1.5 / SeaMonkey 1.0"),
    ("1.8.1", "Firefox 2 / Thunderbird 2 / SeaMonkey 1.1"),
    ("1.9", "Firefox 3"),
    ("1.9.1", "Firefox 3.5 / Thunderbird 3.0 / SeaMonkey 2.0"),
    ("1.9.2", "Firefox 3.6 / Thunderbird 3.1 / Fennec 1.0"),
    ("2.0", "Firefox 4 / Thunderbird 3.3 / SeaMonkey 2.1"),
];

/// Append `.0` to a bare major version.
pub fn dotted(version: &str) -> String {
    if version.contains('.') {
        version.to_string()
    } else {
        format!("{version}.0")
    }
}

/// Major number of a dotted numeric version.
fn major(version: &str) -> Option<u32> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    parts
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        .then_some(major)
}

/// Firefox version for a Gecko version, as used by `CompatGeckoDesktop`.
pub fn gecko_desktop(gecko: &str) -> Option<String> {
    let gecko = gecko.trim();
    if let Some((_, firefox)) = GECKO_DESKTOP.iter().find(|(g, _)| *g == gecko) {
        return Some(firefox.to_string());
    }
    let bare = gecko.strip_suffix(".0").unwrap_or(gecko);
    match bare.parse::<u32>() {
        Ok(n) if n >= 5 && !bare.starts_with('0') => Some(format!("{n}.0")),
        _ => None,
    }
}

/// Firefox for Android version for a Gecko version.
///
/// Every 1.x Gecko maps to the first mobile release.
pub fn gecko_mobile(gecko: &str) -> Option<String> {
    let gecko = gecko.trim();
    if major(gecko) == Some(1) {
        return Some("1.0".to_string());
    }
    gecko_desktop(gecko)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FxOsVersion {
    Known(String),
    /// The override is not valid for the Gecko version; the computed
    /// version is kept.
    BadOverride(String),
    Unknown,
}

/// Firefox OS version for a Gecko version, with an optional override.
pub fn gecko_fxos(gecko: &str, override_version: Option<&str>) -> FxOsVersion {
    let Some(n) = major(gecko.trim()) else {
        return FxOsVersion::Unknown;
    };
    let Some((_, version)) = GECKO_FXOS.iter().find(|(last, _)| n <= *last) else {
        return FxOsVersion::Unknown;
    };
    match override_version.map(str::trim).filter(|o| !o.is_empty()) {
        None => FxOsVersion::Known(version.to_string()),
        Some(o) if *version == "1.0" && FXOS_OVERRIDES.contains(&o) => {
            FxOsVersion::Known(o.to_string())
        }
        Some(_) => FxOsVersion::BadOverride(version.to_string()),
    }
}

/// Text of `{{geckoRelease}}`: the products shipped with a Gecko version.
pub fn gecko_release(release: &str) -> String {
    let release = release.trim();
    if let Some((_, products)) = EARLY_RELEASES.iter().find(|(g, _)| *g == release) {
        return format!("({products})");
    }

    let (version, plus) = match release.strip_suffix('+') {
        Some(v) => (v, "+"),
        None => (release, ""),
    };
    let Some(n) = major(version).filter(|&n| n >= 5) else {
        return format!("(Gecko {release})");
    };
    let version = dotted(version);
    let mut products = vec![
        format!("Firefox {version}{plus}"),
        format!("Thunderbird {version}{plus}"),
        format!("SeaMonkey 2.{}{plus}", n - 3),
    ];
    if let Some((_, fxos)) = FXOS_RELEASES.iter().find(|(g, _)| *g == n) {
        products.extend(fxos.iter().map(|v| format!("Firefox OS {v}")));
    }
    format!("({})", products.join(" / "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gecko_desktop() {
        assert_eq!(gecko_desktop("1").as_deref(), Some("1.0"));
        assert_eq!(gecko_desktop("8.0").as_deref(), Some("8.0"));
        assert_eq!(gecko_desktop("1.9.2").as_deref(), Some("3.6"));
        assert_eq!(gecko_desktop("27").as_deref(), Some("27.0"));
        assert_eq!(gecko_desktop("Yep"), None);
        assert_eq!(gecko_desktop("1.7").as_deref(), Some("1.0"));
        assert_eq!(gecko_desktop("1.1"), None);
        assert_eq!(gecko_desktop("3.5"), None);
    }

    #[test]
    fn test_gecko_mobile() {
        assert_eq!(gecko_mobile("1").as_deref(), Some("1.0"));
        assert_eq!(gecko_mobile("1.11").as_deref(), Some("1.0"));
        assert_eq!(gecko_mobile("2").as_deref(), Some("4.0"));
        assert_eq!(gecko_mobile("Yep"), None);
    }

    #[test]
    fn test_gecko_fxos() {
        let known = |v: &str| FxOsVersion::Known(v.to_string());
        assert_eq!(gecko_fxos("7", None), known("1.0"));
        assert_eq!(gecko_fxos("10", None), known("1.0"));
        assert_eq!(gecko_fxos("24", None), known("1.2"));
        assert_eq!(gecko_fxos("28", None), known("1.3"));
        assert_eq!(gecko_fxos("29", None), known("1.4"));
        assert_eq!(gecko_fxos("32", None), known("2.0"));
        assert_eq!(gecko_fxos("34", None), known("2.1"));
        assert_eq!(gecko_fxos("35", None), known("2.2"));
        assert_eq!(gecko_fxos("999999", None), FxOsVersion::Unknown);
        assert_eq!(gecko_fxos("Yep", None), FxOsVersion::Unknown);
    }

    #[test]
    fn test_gecko_fxos_override() {
        assert_eq!(
            gecko_fxos("7", Some("1.0.1")),
            FxOsVersion::Known("1.0.1".into())
        );
        assert_eq!(gecko_fxos("7", Some("1.1")), FxOsVersion::Known("1.1".into()));
        assert_eq!(
            gecko_fxos("18", Some("5.0")),
            FxOsVersion::BadOverride("1.0".into())
        );
    }

    #[test]
    fn test_gecko_release() {
        assert_eq!(
            gecko_release("1.9.2"),
            "(Firefox 3.6 / Thunderbird 3.1 / Fennec 1.0)"
        );
        assert_eq!(
            gecko_release("19.0"),
            "(Firefox 19.0 / Thunderbird 19.0 / SeaMonkey 2.16)"
        );
        assert_eq!(
            gecko_release("18.0"),
            "(Firefox 18.0 / Thunderbird 18.0 / SeaMonkey 2.15 / Firefox OS 1.0.1 / \
             Firefox OS 1.1)"
        );
        assert_eq!(
            gecko_release("33.0+"),
            "(Firefox 33.0+ / Thunderbird 33.0+ / SeaMonkey 2.30+)"
        );
    }
}
