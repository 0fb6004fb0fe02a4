use crate::AttrValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identity of a resource within a catalog: `(type, title)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    #[serde(rename = "type")]
    pub type_name: String,
    pub title: String,
}

impl ResourceKey {
    pub fn new(type_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.type_name, self.title)
    }
}

/// Where a resource was declared. Metadata only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub line: Option<u64>,
}

impl SourceLocation {
    /// Returns `None` when neither file nor line is known
    pub fn from_parts(file: Option<String>, line: Option<u64>) -> Option<Self> {
        if file.is_none() && line.is_none() {
            None
        } else {
            Some(Self { file, line })
        }
    }
}

/// One manageable unit of a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub type_name: String,
    pub title: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
    #[serde(default)]
    pub exported: bool,
}

impl Resource {
    pub fn new(type_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            title: title.into(),
            attributes: BTreeMap::new(),
            tags: BTreeSet::new(),
            source_location: None,
            exported: false,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_source(mut self, file: impl Into<String>, line: u64) -> Self {
        self.source_location = Some(SourceLocation {
            file: Some(file.into()),
            line: Some(line),
        });
        self
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.type_name.clone(), self.title.clone())
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn file(&self) -> Option<&str> {
        self.source_location.as_ref().and_then(|loc| loc.file.as_deref())
    }

    pub fn line(&self) -> Option<u64> {
        self.source_location.as_ref().and_then(|loc| loc.line)
    }
}

/// A relationship between two resources of the same catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: ResourceKey,
    pub target: ResourceKey,
}

/// Which of the two compared catalogs something came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogSide {
    #[serde(rename = "from-catalog")]
    From,
    #[serde(rename = "to-catalog")]
    To,
}

impl CatalogSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSide::From => "from-catalog",
            CatalogSide::To => "to-catalog",
        }
    }
}

impl fmt::Display for CatalogSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options consumed by the diff engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Resources carrying any of these tags are left out of the comparison
    #[serde(default)]
    pub ignore_tags: BTreeSet<String>,

    /// Attribute rules (`name-glob` or `Type[title]::name-glob`) skipped during comparison
    #[serde(default)]
    pub ignore_attributes: Vec<String>,

    /// Report source file/line drift as `changed-context` entries
    #[serde(default)]
    pub compare_file_line: bool,

    /// Also diff relationship edges
    #[serde(default)]
    pub include_edges: bool,
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_ignore_attributes<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_attributes.extend(rules.into_iter().map(Into::into));
        self
    }

    pub fn with_file_line(mut self, enabled: bool) -> Self {
        self.compare_file_line = enabled;
        self
    }

    pub fn with_edges(mut self, enabled: bool) -> Self {
        self.include_edges = enabled;
        self
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Tags whose resources are never compared
    #[serde(default)]
    pub ignore_tags: Vec<String>,

    /// Attribute rules skipped during comparison (e.g., "mode", "File[/etc/*]::content")
    #[serde(default)]
    pub ignore_attributes: Vec<String>,

    /// Report source file/line drift
    #[serde(default)]
    pub compare_file_line: bool,

    /// Diff relationship edges
    #[serde(default)]
    pub include_edges: bool,
}

impl AppConfig {
    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions::new()
            .with_ignore_tags(self.ignore_tags.iter().cloned())
            .with_ignore_attributes(self.ignore_attributes.iter().cloned())
            .with_file_line(self.compare_file_line)
            .with_edges(self.include_edges)
    }
}
