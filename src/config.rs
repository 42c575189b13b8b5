use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::Subject;
use crate::issues::Severity;
use crate::scrape::ScrapeOptions;

/// How scrape results are printed.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// The whole result as pretty JSON
    #[default]
    Json,
    /// Rendered issues only
    Issues,
}

/// Minimum severity shown when rendering issues.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MinSeverity {
    #[default]
    Warning,
    Error,
    Critical,
}

impl From<MinSeverity> for Severity {
    fn from(value: MinSeverity) -> Self {
        match value {
            MinSeverity::Warning => Severity::Warning,
            MinSeverity::Error => Severity::Error,
            MinSeverity::Critical => Severity::Critical,
        }
    }
}

/// The feature a page documents.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeatureConfig {
    pub id: u64,
    pub slug: String,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            id: 1,
            slug: "feature".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    /// JSON resolution catalogue; everything is a placeholder without one
    pub data: Option<PathBuf>,
    pub feature: FeatureConfig,
    pub output: OutputFormat,
    pub min_severity: MinSeverity,
    /// Render issues with annotated source context
    pub context: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            data: None,
            feature: FeatureConfig::default(),
            output: OutputFormat::default(),
            min_severity: MinSeverity::default(),
            context: true,
        }
    }
}

impl Config {
    pub fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            locale: self.locale.clone(),
            subject: Subject {
                id: self.feature.id,
                slug: self.feature.slug.clone(),
            },
        }
    }
}

#[derive(Default, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.config.locale = locale.into();
        self
    }

    pub fn data(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data = Some(path.into());
        self
    }

    pub fn feature(mut self, id: u64, slug: impl Into<String>) -> Self {
        self.config.feature = FeatureConfig {
            id,
            slug: slug.into(),
        };
        self
    }

    pub fn output(mut self, output: OutputFormat) -> Self {
        self.config.output = output;
        self
    }

    pub fn min_severity(mut self, severity: MinSeverity) -> Self {
        self.config.min_severity = severity;
        self
    }

    pub fn context(mut self, context: bool) -> Self {
        self.config.context = context;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

const CANDIDATE_NAMES: &[&str] = &[".kumascrape.toml", "kumascrape.toml"];

fn parse_config_str(s: &str, path: &Path) -> io::Result<Config> {
    let mut config = toml::from_str::<Config>(s).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid config {}: {e}", path.display()),
        )
    })?;
    // Relative catalogue paths are relative to the config file.
    if let Some(data) = &config.data
        && data.is_relative()
        && let Some(dir) = path.parent()
    {
        config.data = Some(dir.join(data));
    }
    Ok(config)
}

fn read_config(path: &Path) -> io::Result<Config> {
    log::debug!("Reading config from: {}", path.display());
    let s = fs::read_to_string(path)?;
    let config = parse_config_str(&s, path)?;
    log::info!("Loaded config from: {}", path.display());
    Ok(config)
}

fn find_in_tree(start_dir: &Path) -> Option<PathBuf> {
    for dir in start_dir.ancestors() {
        for name in CANDIDATE_NAMES {
            let p = dir.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
    }
    None
}

fn xdg_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let p = Path::new(&xdg).join("kumascrape").join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }
    if let Ok(home) = env::var("HOME") {
        let p = Path::new(&home)
            .join(".config")
            .join("kumascrape")
            .join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }
    None
}

/// Load configuration with precedence:
/// 1) explicit path (error if unreadable/invalid)
/// 2) walk up from start_dir: .kumascrape.toml, kumascrape.toml
/// 3) XDG: $XDG_CONFIG_HOME/kumascrape/config.toml or ~/.config/kumascrape/config.toml
/// 4) default config
pub fn load(explicit: Option<&Path>, start_dir: &Path) -> io::Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let cfg = read_config(path)?;
        return Ok((cfg, Some(path.to_path_buf())));
    }

    if let Some(p) = find_in_tree(start_dir)
        && let Ok(cfg) = read_config(&p)
    {
        return Ok((cfg, Some(p)));
    }

    if let Some(p) = xdg_config_path()
        && let Ok(cfg) = read_config(&p)
    {
        return Ok((cfg, Some(p)));
    }

    log::debug!("No config file found, using defaults");
    Ok((Config::default(), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let cfg = toml::from_str::<Config>("locale = \"de\"").unwrap();
        assert_eq!(cfg.locale, "de");
        assert_eq!(cfg.feature, FeatureConfig::default());
        assert!(cfg.context);
        assert_eq!(cfg.output, OutputFormat::Json);
    }

    #[test]
    fn test_full_config() {
        let cfg = toml::from_str::<Config>(
            r#"
            output = "issues"
            min_severity = "error"
            context = false

            [feature]
            id = 42
            slug = "web-css-display"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.output, OutputFormat::Issues);
        assert_eq!(Severity::from(cfg.min_severity), Severity::Error);
        assert!(!cfg.context);
        let options = cfg.scrape_options();
        assert_eq!(options.subject.id, 42);
        assert_eq!(options.subject.slug, "web-css-display");
    }

    #[test]
    fn test_builder() {
        let cfg = ConfigBuilder::default()
            .locale("ja")
            .data("mdn.json")
            .feature(9, "web-api-window")
            .output(OutputFormat::Issues)
            .min_severity(MinSeverity::Critical)
            .context(false)
            .build();
        assert_eq!(cfg.data, Some(PathBuf::from("mdn.json")));
        assert_eq!(cfg.scrape_options().locale, "ja");
        assert_eq!(cfg.scrape_options().subject.slug, "web-api-window");
        assert_eq!(Severity::from(cfg.min_severity), Severity::Critical);
    }

    #[test]
    fn test_invalid_config_is_invalid_data() {
        let err = parse_config_str("output = \"yaml\"", Path::new("k.toml")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("k.toml"));
    }

    #[test]
    fn test_relative_data_path() {
        let cfg = parse_config_str("data = \"mdn.json\"", Path::new("/site/kumascrape.toml"))
            .unwrap();
        assert_eq!(cfg.data, Some(PathBuf::from("/site/mdn.json")));
    }

    #[test]
    fn test_walk_up_finds_config() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(".kumascrape.toml"), "locale = \"fr\"").unwrap();

        let (cfg, path) = load(None, &nested).unwrap();
        assert_eq!(cfg.locale, "fr");
        assert_eq!(path, Some(dir.path().join(".kumascrape.toml")));
    }

    #[test]
    fn test_explicit_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("nope.toml")), dir.path()).is_err());
    }
}
