use crate::{AttrValue, CatalogSide, ResourceKey};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a reported difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    /// Present only in the "to" catalog
    Added,
    /// Present only in the "from" catalog
    Removed,
    /// Attribute value differs
    Changed,
    /// Source file or line differs
    ChangedContext,
}

impl DiffKind {
    /// The kind the same difference has when the catalogs are swapped
    pub fn reversed(self) -> Self {
        match self {
            DiffKind::Added => DiffKind::Removed,
            DiffKind::Removed => DiffKind::Added,
            other => other,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            DiffKind::Added => "+",
            DiffKind::Removed => "-",
            DiffKind::Changed => "~",
            DiffKind::ChangedContext => "@",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiffKind::Added => "added",
            DiffKind::Removed => "removed",
            DiffKind::Changed => "changed",
            DiffKind::ChangedContext => "changed-context",
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source-location field reported by a `changed-context` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextField {
    File,
    Line,
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextField::File => f.write_str("file"),
            ContextField::Line => f.write_str("line"),
        }
    }
}

/// What part of a resource an entry refers to.
///
/// Variant order is the sort order within one resource: the whole resource
/// first, then attributes, then context fields, then outgoing edges.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiffPath {
    Resource,
    Attribute(String),
    Context(ContextField),
    Edge(ResourceKey),
}

/// One reported difference
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    pub kind: DiffKind,
    pub resource: ResourceKey,
    pub path: DiffPath,
    pub old_value: Option<AttrValue>,
    pub new_value: Option<AttrValue>,
}

impl DiffEntry {
    pub fn resource_added(resource: ResourceKey) -> Self {
        Self {
            kind: DiffKind::Added,
            resource,
            path: DiffPath::Resource,
            old_value: None,
            new_value: None,
        }
    }

    pub fn resource_removed(resource: ResourceKey) -> Self {
        Self {
            kind: DiffKind::Removed,
            resource,
            path: DiffPath::Resource,
            old_value: None,
            new_value: None,
        }
    }

    /// Flat, human-readable identity, e.g. `File[/etc/motd] -> mode`.
    /// Context entries use `@` so they never collide with an attribute of the same name.
    pub fn identity(&self) -> String {
        match &self.path {
            DiffPath::Resource => self.resource.to_string(),
            DiffPath::Attribute(name) => format!("{} -> {}", self.resource, name),
            DiffPath::Context(field) => format!("{} @ {}", self.resource, field),
            DiffPath::Edge(target) => format!("{} => {}", self.resource, target),
        }
    }

    /// Deterministic ordering key: type, title, path, then kind
    pub fn sort_key(&self) -> (&ResourceKey, &DiffPath, DiffKind) {
        (&self.resource, &self.path, self.kind)
    }

    /// The same difference seen with the two catalogs swapped
    pub fn reversed(&self) -> Self {
        Self {
            kind: self.kind.reversed(),
            resource: self.resource.clone(),
            path: self.path.clone(),
            old_value: self.new_value.clone(),
            new_value: self.old_value.clone(),
        }
    }

    pub fn is_context(&self) -> bool {
        self.kind == DiffKind::ChangedContext
    }
}

/// Serialized as the flat tuple `[kind, identity, old?, new?]`.
///
/// `added` carries only the new value and `removed` only the old one;
/// whole-resource entries carry neither. `changed` and `changed-context`
/// always carry both slots, with `null` for a missing side.
impl Serialize for DiffEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        seq.serialize_element(&self.kind)?;
        seq.serialize_element(&self.identity())?;
        match self.kind {
            DiffKind::Added => {
                if let Some(value) = &self.new_value {
                    seq.serialize_element(value)?;
                }
            }
            DiffKind::Removed => {
                if let Some(value) = &self.old_value {
                    seq.serialize_element(value)?;
                }
            }
            DiffKind::Changed | DiffKind::ChangedContext => {
                seq.serialize_element(&self.old_value)?;
                seq.serialize_element(&self.new_value)?;
            }
        }
        seq.end()
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.symbol(), self.identity())?;
        match (&self.old_value, &self.new_value) {
            (Some(old), Some(new)) => write!(f, ": {} => {}", old, new),
            (Some(old), None) => write!(f, ": {}", old),
            (None, Some(new)) => write!(f, ": {}", new),
            (None, None) => Ok(()),
        }
    }
}

/// A resource left out of the comparison because of an ignore tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionRecord {
    pub resource: ResourceKey,
    pub tag: String,
    pub origin: CatalogSide,
}

impl fmt::Display for SuppressionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ignoring type='{}', title='{}' based on tag in {}",
            self.resource.type_name, self.resource.title, self.origin
        )
    }
}
