use crate::identity::{identity_key, parse_reference};
use catdiff_common::{AttrValue, CatDiffError, Edge, Resource, ResourceKey, SourceLocation};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RawCatalog {
    resources: Vec<RawResource>,
    #[serde(default)]
    edges: Vec<RawEdge>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(rename = "type")]
    type_name: Option<String>,
    title: Option<String>,
    #[serde(default, alias = "attributes")]
    parameters: BTreeMap<String, AttrValue>,
    #[serde(default)]
    tags: Vec<String>,
    file: Option<String>,
    line: Option<u64>,
    #[serde(default)]
    exported: bool,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    source: String,
    target: String,
}

/// An immutable set of resources plus their relationship edges.
///
/// Construction rejects resources without a type or title and duplicate
/// identity keys, so every catalog handed to the engine is well formed.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    resources: Vec<Resource>,
    index: HashMap<ResourceKey, usize>,
    edges: Vec<Edge>,
}

impl Catalog {
    pub fn new(resources: Vec<Resource>, edges: Vec<Edge>) -> Result<Self, CatDiffError> {
        let mut index = HashMap::with_capacity(resources.len());

        for (position, resource) in resources.iter().enumerate() {
            if resource.type_name.trim().is_empty() {
                return Err(CatDiffError::MalformedCatalog(format!(
                    "Resource #{} has an empty type",
                    position
                )));
            }
            if resource.title.is_empty() {
                return Err(CatDiffError::MalformedCatalog(format!(
                    "Resource #{} ({}) has an empty title",
                    position, resource.type_name
                )));
            }

            let key = identity_key(resource);
            if index.contains_key(&key) {
                return Err(CatDiffError::DuplicateResource(key.to_string()));
            }
            index.insert(key, position);
        }

        Ok(Self {
            resources,
            index,
            edges,
        })
    }

    /// Build a catalog from a JSON document.
    ///
    /// Accepts both the bare `{"resources": [...], "edges": [...]}` shape and
    /// the wrapped `{"document_type": "Catalog", "data": {...}}` shape.
    pub fn from_json_str(content: &str) -> Result<Self, CatDiffError> {
        let document: JsonValue = serde_json::from_str(content)
            .map_err(|e| CatDiffError::MalformedCatalog(format!("Failed to parse catalog JSON: {}", e)))?;

        let body = match document {
            JsonValue::Object(mut map) if !map.contains_key("resources") && map.contains_key("data") => {
                map.remove("data").unwrap_or(JsonValue::Null)
            }
            other => other,
        };

        let raw: RawCatalog = serde_json::from_value(body)
            .map_err(|e| CatDiffError::MalformedCatalog(format!("Invalid catalog document: {}", e)))?;

        Self::from_raw(raw)
    }

    /// Read and build a catalog from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, CatDiffError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatDiffError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read catalog {}: {}", path.display(), e),
            ))
        })?;

        let catalog = Self::from_json_str(&content).map_err(|e| match e {
            CatDiffError::MalformedCatalog(msg) => {
                CatDiffError::MalformedCatalog(format!("{}: {}", path.display(), msg))
            }
            CatDiffError::DuplicateResource(key) => {
                CatDiffError::DuplicateResource(format!("{} in {}", key, path.display()))
            }
            other => other,
        })?;

        debug!(
            "Loaded {} resources and {} edges from {}",
            catalog.len(),
            catalog.edges.len(),
            path.display()
        );
        Ok(catalog)
    }

    fn from_raw(raw: RawCatalog) -> Result<Self, CatDiffError> {
        let mut resources = Vec::with_capacity(raw.resources.len());

        for (position, item) in raw.resources.into_iter().enumerate() {
            let type_name = item.type_name.ok_or_else(|| {
                CatDiffError::MalformedCatalog(format!("Resource #{} is missing 'type'", position))
            })?;
            let title = item.title.ok_or_else(|| {
                CatDiffError::MalformedCatalog(format!(
                    "Resource #{} ({}) is missing 'title'",
                    position, type_name
                ))
            })?;

            resources.push(Resource {
                type_name,
                title,
                attributes: item.parameters,
                tags: item.tags.into_iter().collect(),
                source_location: SourceLocation::from_parts(item.file, item.line),
                exported: item.exported,
            });
        }

        let edges = raw
            .edges
            .iter()
            .map(|edge| {
                Ok(Edge {
                    source: parse_reference(&edge.source)?,
                    target: parse_reference(&edge.target)?,
                })
            })
            .collect::<Result<Vec<_>, CatDiffError>>()?;

        Self::new(resources, edges)
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&Resource> {
        self.index.get(key).map(|&position| &self.resources[position])
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.index.contains_key(key)
    }

    /// Resources in document order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of exported resources. They take part in the diff like any other.
    pub fn exported_count(&self) -> usize {
        self.resources.iter().filter(|r| r.exported).count()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
