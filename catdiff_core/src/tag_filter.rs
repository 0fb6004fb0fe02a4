use crate::identity::identity_key;
use crate::sink::DiagnosticSink;
use catdiff_common::{CatalogSide, Resource, SuppressionRecord};
use std::collections::BTreeSet;

/// True iff the resource carries at least one of `ignore_tags`
pub fn should_ignore(resource: &Resource, ignore_tags: &BTreeSet<String>) -> bool {
    !resource.tags.is_disjoint(ignore_tags)
}

/// Decides which resources are left out of the comparison because of their tags
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    ignore_tags: BTreeSet<String>,
}

impl TagFilter {
    pub fn new(ignore_tags: BTreeSet<String>) -> Self {
        Self { ignore_tags }
    }

    pub fn should_ignore(&self, resource: &Resource) -> bool {
        should_ignore(resource, &self.ignore_tags)
    }

    /// The first (lexicographically) ignore tag the resource carries
    pub fn matching_tag<'a>(&'a self, resource: &Resource) -> Option<&'a str> {
        self.ignore_tags
            .iter()
            .find(|tag| resource.tags.contains(*tag))
            .map(String::as_str)
    }

    /// Check one side of a comparison. An ignored resource is reported to the
    /// sink and its record returned; anything else yields `None`.
    pub fn apply(
        &self,
        resource: &Resource,
        origin: CatalogSide,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<SuppressionRecord> {
        let tag = self.matching_tag(resource)?;
        let record = SuppressionRecord {
            resource: identity_key(resource),
            tag: tag.to_string(),
            origin,
        };
        sink.suppressed(&record);
        Some(record)
    }
}
