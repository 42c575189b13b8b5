//! Name resolution against existing browsers, features, specifications
//! and versions.
//!
//! The scraper never persists anything. It asks a [`Store`] whether an
//! entity already exists, and otherwise hands out a placeholder [`Id`]
//! (a string with a leading `_`) so downstream code can tell new records
//! from existing ones. [`Data`] wraps a store and caches every answer for
//! the lifetime of one scrape.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::{normalize_name, slugify};

/// Identifier of a record: an existing store id or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Known(u64),
    New(String),
}

impl Id {
    /// Placeholder id for an entity the store does not have.
    pub fn placeholder(name: impl fmt::Display) -> Self {
        Id::New(format!("_{name}"))
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Id::New(_))
    }

    pub fn known(&self) -> Option<u64> {
        match self {
            Id::Known(id) => Some(*id),
            Id::New(_) => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Known(id) => id.fmt(f),
            Id::New(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Browser {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub id: u64,
    pub mdn_key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: u64,
    pub specification: u64,
    #[serde(default)]
    pub subpath: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: u64,
    pub browser: u64,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    pub id: u64,
    pub version: u64,
    pub feature: u64,
}

/// Backend that knows which entities already exist.
pub trait Store {
    fn browser_by_name(&self, name: &str) -> Option<Browser>;
    /// Child of `parent` whose normalised name is `name`.
    fn child_feature(&self, parent: u64, name: &str) -> Option<Feature>;
    fn feature_slug_taken(&self, slug: &str) -> bool;
    fn specification_by_key(&self, mdn_key: &str) -> Option<Specification>;
    fn section(&self, specification: u64, subpath: &str) -> Option<Section>;
    fn version(&self, browser: u64, version: &str) -> Option<Version>;
    fn support(&self, version: u64, feature: u64) -> Option<Support>;
}

#[derive(Debug)]
pub enum DataError {
    Io(PathBuf, io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(path, err) => write!(f, "failed to read {}: {}", path.display(), err),
            DataError::Json(err) => write!(f, "invalid data catalogue: {err}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(_, err) => Some(err),
            DataError::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Json(err)
    }
}

/// A store held in memory, loaded from a JSON catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStore {
    pub browsers: Vec<Browser>,
    pub features: Vec<Feature>,
    pub specifications: Vec<Specification>,
    pub sections: Vec<Section>,
    pub versions: Vec<Version>,
    pub supports: Vec<Support>,
}

impl MemoryStore {
    pub fn from_json(text: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, DataError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| DataError::Io(path.to_path_buf(), e))?;
        log::info!("Loading data catalogue from {}", path.display());
        Self::from_json(&text)
    }
}

impl Store for MemoryStore {
    fn browser_by_name(&self, name: &str) -> Option<Browser> {
        self.browsers.iter().find(|b| b.name == name).cloned()
    }

    fn child_feature(&self, parent: u64, name: &str) -> Option<Feature> {
        self.features
            .iter()
            .find(|f| f.parent == Some(parent) && normalize_name(&f.name) == name)
            .cloned()
    }

    fn feature_slug_taken(&self, slug: &str) -> bool {
        self.features.iter().any(|f| f.slug == slug)
    }

    fn specification_by_key(&self, mdn_key: &str) -> Option<Specification> {
        self.specifications
            .iter()
            .find(|s| s.mdn_key == mdn_key)
            .cloned()
    }

    fn section(&self, specification: u64, subpath: &str) -> Option<Section> {
        self.sections
            .iter()
            .find(|s| s.specification == specification && s.subpath == subpath)
            .cloned()
    }

    fn version(&self, browser: u64, version: &str) -> Option<Version> {
        self.versions
            .iter()
            .find(|v| v.browser == browser && v.version == version)
            .cloned()
    }

    fn support(&self, version: u64, feature: u64) -> Option<Support> {
        self.supports
            .iter()
            .find(|s| s.version == version && s.feature == feature)
            .cloned()
    }
}

/// Header names used on pages, mapped to store browser names.
const BROWSER_NAME_FIXES: &[(&str, &str)] = &[
    ("Android", "Android Browser"),
    ("Chrome", "Chrome for Desktop"),
    ("Firefox (Gecko)", "Firefox for Desktop"),
    ("Firefox", "Firefox for Desktop"),
    ("Firefox Mobile (Gecko)", "Firefox for Android"),
    ("Firefox Mobile", "Firefox for Android"),
    ("IE Mobile", "Internet Explorer Mobile"),
    ("IE Phone", "Internet Explorer Mobile"),
    ("IE", "Internet Explorer for Desktop"),
    ("Internet Explorer", "Internet Explorer for Desktop"),
    ("Opera", "Opera for Desktop"),
    ("Safari (WebKit)", "Safari for Desktop"),
    ("Safari Mobile", "Safari for iOS"),
    ("Safari", "Safari for Desktop"),
    ("Windows Phone", "Internet Explorer Mobile"),
];

pub fn fix_browser_name(name: &str) -> &str {
    BROWSER_NAME_FIXES
        .iter()
        .find(|(raw, _)| *raw == name)
        .map_or(name, |(_, fixed)| fixed)
}

/// The feature a page documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: u64,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserLookup {
    pub browser: Option<Browser>,
    pub id: Id,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLookup {
    pub feature: Option<Feature>,
    pub id: Id,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLookup {
    pub version: Option<Version>,
    pub id: Id,
}

/// Caching facade over a [`Store`].
pub struct Data {
    store: Box<dyn Store>,
    browsers: HashMap<String, BrowserLookup>,
    features: HashMap<(u64, String), FeatureLookup>,
    specifications: HashMap<String, Option<Specification>>,
    sections: HashMap<(u64, String), Option<Section>>,
    versions: HashMap<(Id, String), VersionLookup>,
    supports: HashMap<(Id, Id), Id>,
    issued_slugs: HashSet<String>,
}

impl Default for Data {
    fn default() -> Self {
        Self::new(MemoryStore::default())
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("browsers", &self.browsers.len())
            .field("features", &self.features.len())
            .finish_non_exhaustive()
    }
}

impl Data {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Box::new(store),
            browsers: HashMap::new(),
            features: HashMap::new(),
            specifications: HashMap::new(),
            sections: HashMap::new(),
            versions: HashMap::new(),
            supports: HashMap::new(),
            issued_slugs: HashSet::new(),
        }
    }

    /// Resolve a browser column header.
    pub fn lookup_browser(&mut self, raw_name: &str) -> BrowserLookup {
        if let Some(hit) = self.browsers.get(raw_name) {
            return hit.clone();
        }
        let name = fix_browser_name(raw_name);
        let lookup = match self.store.browser_by_name(name) {
            Some(browser) => BrowserLookup {
                id: Id::Known(browser.id),
                name: browser.name.clone(),
                slug: browser.slug.clone(),
                browser: Some(browser),
            },
            None => BrowserLookup {
                browser: None,
                id: Id::placeholder(name),
                name: name.to_string(),
                slug: slugify(name, 0),
            },
        };
        self.browsers.insert(raw_name.to_string(), lookup.clone());
        lookup
    }

    /// Resolve a feature row under `parent`. "Basic Support" is the
    /// parent itself.
    pub fn lookup_feature(&mut self, parent: &Subject, name: &str) -> FeatureLookup {
        let normalized = normalize_name(name);
        let key = (parent.id, normalized.clone());
        if let Some(hit) = self.features.get(&key) {
            return hit.clone();
        }

        let lookup = if normalized.trim() == "basic support" {
            FeatureLookup {
                feature: None,
                id: Id::Known(parent.id),
                slug: parent.slug.clone(),
            }
        } else if let Some(feature) = self.store.child_feature(parent.id, &normalized) {
            FeatureLookup {
                id: Id::Known(feature.id),
                slug: feature.slug.clone(),
                feature: Some(feature),
            }
        } else {
            FeatureLookup {
                feature: None,
                id: Id::placeholder(&normalized),
                slug: self.unique_slug(&format!("{}_{}", parent.slug, normalized)),
            }
        };
        self.features.insert(key, lookup.clone());
        lookup
    }

    fn unique_slug(&mut self, name: &str) -> String {
        let mut suffix = 0;
        loop {
            let slug = slugify(name, suffix);
            if !self.store.feature_slug_taken(&slug) && !self.issued_slugs.contains(&slug) {
                self.issued_slugs.insert(slug.clone());
                return slug;
            }
            suffix += 1;
        }
    }

    pub fn lookup_specification(&mut self, mdn_key: &str) -> Option<Specification> {
        if let Some(hit) = self.specifications.get(mdn_key) {
            return hit.clone();
        }
        let spec = self.store.specification_by_key(mdn_key);
        self.specifications.insert(mdn_key.to_string(), spec.clone());
        spec
    }

    pub fn lookup_section(&mut self, specification: u64, subpath: &str) -> Option<Section> {
        let key = (specification, subpath.to_string());
        if let Some(hit) = self.sections.get(&key) {
            return hit.clone();
        }
        let section = self.store.section(specification, subpath);
        self.sections.insert(key, section.clone());
        section
    }

    pub fn lookup_version(&mut self, browser: &BrowserLookup, version: &str) -> VersionLookup {
        let key = (browser.id.clone(), version.to_string());
        if let Some(hit) = self.versions.get(&key) {
            return hit.clone();
        }
        let found = browser
            .id
            .known()
            .and_then(|id| self.store.version(id, version));
        let lookup = match found {
            Some(v) => VersionLookup {
                id: Id::Known(v.id),
                version: Some(v),
            },
            None => VersionLookup {
                version: None,
                id: Id::placeholder(format!("{}-{}", browser.name, version)),
            },
        };
        self.versions.insert(key, lookup.clone());
        lookup
    }

    pub fn lookup_support(&mut self, version: &Id, feature: &Id) -> Id {
        let key = (version.clone(), feature.clone());
        if let Some(hit) = self.supports.get(&key) {
            return hit.clone();
        }
        let found = match (version.known(), feature.known()) {
            (Some(v), Some(f)) => self.store.support(v, f),
            _ => None,
        };
        let id = match found {
            Some(support) => Id::Known(support.id),
            None => Id::placeholder(format!("{feature}-{version}")),
        };
        self.supports.insert(key, id.clone());
        id
    }
}
