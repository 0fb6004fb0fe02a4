pub mod attributes;
pub mod catalog;
pub mod engine;
pub mod identity;
pub mod sink;
pub mod tag_filter;

pub use attributes::{AttributeComparator, IgnoreRule};
pub use catalog::Catalog;
pub use engine::{diff_catalogs, DiffEngine, DiffOutcome};
pub use identity::{identity_key, parse_reference};
pub use sink::{DiagnosticSink, NullSink, TracingSink};
pub use tag_filter::{should_ignore, TagFilter};
