use crate::attributes::AttributeComparator;
use crate::catalog::Catalog;
use crate::identity::identity_key;
use crate::sink::{DiagnosticSink, TracingSink};
use crate::tag_filter::TagFilter;
use catdiff_common::{
    CatDiffError, CatalogSide, DiffEntry, DiffKind, DiffOptions, DiffPath, Edge, ResourceKey,
    SuppressionRecord,
};
use std::collections::HashSet;
use tracing::{debug, info};

/// Result of comparing two catalogs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffOutcome {
    /// Differences, sorted by type, title and path
    pub entries: Vec<DiffEntry>,
    /// Resources left out because of an ignore tag, one record per tagged side
    pub suppressed: Vec<SuppressionRecord>,
}

impl DiffOutcome {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn count(&self, kind: DiffKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Drop `changed-context` entries, keeping value differences only
    pub fn without_context(mut self) -> Self {
        self.entries.retain(|e| !e.is_context());
        self
    }
}

/// Diff engine for comparing two catalogs
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    tag_filter: TagFilter,
    comparator: AttributeComparator,
    include_edges: bool,
}

impl DiffEngine {
    /// Build an engine from options. Fails only on invalid ignore-attribute rules.
    pub fn new(options: &DiffOptions) -> Result<Self, CatDiffError> {
        let comparator = AttributeComparator::new()
            .with_ignore_rules(options.ignore_attributes.as_slice())?
            .with_file_line(options.compare_file_line);

        Ok(Self {
            tag_filter: TagFilter::new(options.ignore_tags.clone()),
            comparator,
            include_edges: options.include_edges,
        })
    }

    /// Compare two catalogs, logging suppressions through `tracing`
    pub fn compare(&self, from: &Catalog, to: &Catalog) -> DiffOutcome {
        self.compare_with_sink(from, to, &mut TracingSink)
    }

    /// Compare two catalogs, reporting suppressions to `sink`
    pub fn compare_with_sink(
        &self,
        from: &Catalog,
        to: &Catalog,
        sink: &mut dyn DiagnosticSink,
    ) -> DiffOutcome {
        info!(
            "Comparing {} from-catalog resources with {} to-catalog resources",
            from.len(),
            to.len()
        );

        let mut entries = Vec::new();
        let mut suppressed = Vec::new();
        let mut ignored: HashSet<ResourceKey> = HashSet::new();

        for old in from.resources() {
            let key = identity_key(old);

            match to.get(&key) {
                None => {
                    if let Some(record) = self.tag_filter.apply(old, CatalogSide::From, sink) {
                        suppressed.push(record);
                        ignored.insert(key);
                        continue;
                    }
                    entries.push(DiffEntry::resource_removed(key));
                }
                Some(new) => {
                    // Both sides are checked so each tagged side is logged.
                    let old_record = self.tag_filter.apply(old, CatalogSide::From, sink);
                    let new_record = self.tag_filter.apply(new, CatalogSide::To, sink);

                    if old_record.is_some() || new_record.is_some() {
                        suppressed.extend(old_record);
                        suppressed.extend(new_record);
                        ignored.insert(key);
                        continue;
                    }

                    entries.extend(self.comparator.compare(old, new));
                }
            }
        }

        for new in to.resources() {
            let key = identity_key(new);
            if from.contains(&key) {
                continue;
            }

            if let Some(record) = self.tag_filter.apply(new, CatalogSide::To, sink) {
                suppressed.push(record);
                ignored.insert(key);
                continue;
            }
            entries.push(DiffEntry::resource_added(key));
        }

        if self.include_edges {
            entries.extend(diff_edges(from.edges(), to.edges(), &ignored));
        }

        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        debug!(
            "Generated {} diff entries, suppressed {} resource sides",
            entries.len(),
            suppressed.len()
        );

        DiffOutcome {
            entries,
            suppressed,
        }
    }
}

/// Match edges as `(source, target)` tuples. Edges touching an ignored
/// resource are skipped on both sides.
fn diff_edges(from: &[Edge], to: &[Edge], ignored: &HashSet<ResourceKey>) -> Vec<DiffEntry> {
    let from_edges = kept_edges(from, ignored);
    let to_edges = kept_edges(to, ignored);

    let removed = from_edges
        .difference(&to_edges)
        .map(|edge| edge_entry(DiffKind::Removed, edge));
    let added = to_edges
        .difference(&from_edges)
        .map(|edge| edge_entry(DiffKind::Added, edge));

    removed.chain(added).collect()
}

fn kept_edges(edges: &[Edge], ignored: &HashSet<ResourceKey>) -> HashSet<Edge> {
    edges
        .iter()
        .filter(|e| !ignored.contains(&e.source) && !ignored.contains(&e.target))
        .cloned()
        .collect()
}

fn edge_entry(kind: DiffKind, edge: &Edge) -> DiffEntry {
    DiffEntry {
        kind,
        resource: edge.source.clone(),
        path: DiffPath::Edge(edge.target.clone()),
        old_value: None,
        new_value: None,
    }
}

/// Compare two catalogs with the given options, logging suppressions through `tracing`
pub fn diff_catalogs(
    from: &Catalog,
    to: &Catalog,
    options: &DiffOptions,
) -> Result<DiffOutcome, CatDiffError> {
    Ok(DiffEngine::new(options)?.compare(from, to))
}
