use crate::identity::identity_key;
use catdiff_common::{
    AttrValue, CatDiffError, ContextField, DiffEntry, DiffKind, DiffPath, Resource, ResourceKey,
};
use glob::Pattern;
use std::collections::BTreeSet;

/// An attribute-name rule, optionally scoped to resources: `mode` or `File[/etc/*]::content`
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    scope: Option<(Pattern, Pattern)>,
    attribute: Pattern,
}

impl IgnoreRule {
    pub fn parse(rule: &str) -> Result<Self, CatDiffError> {
        let compile = |text: &str| {
            Pattern::new(text).map_err(|e| CatDiffError::InvalidPattern(format!("'{}': {}", rule, e)))
        };

        // Type names may contain "::" themselves, so split on the closing bracket.
        if let Some((reference, attribute)) = rule.rsplit_once("]::") {
            let (type_glob, title_glob) = reference.split_once('[').ok_or_else(|| {
                CatDiffError::InvalidPattern(format!("'{}': expected Type[title]::attribute", rule))
            })?;
            if type_glob.is_empty() || title_glob.is_empty() || attribute.is_empty() {
                return Err(CatDiffError::InvalidPattern(format!(
                    "'{}': expected Type[title]::attribute",
                    rule
                )));
            }
            return Ok(Self {
                scope: Some((compile(type_glob)?, compile(title_glob)?)),
                attribute: compile(attribute)?,
            });
        }

        if rule.is_empty() {
            return Err(CatDiffError::InvalidPattern("empty attribute rule".to_string()));
        }

        Ok(Self {
            scope: None,
            attribute: compile(rule)?,
        })
    }

    pub fn matches(&self, key: &ResourceKey, attribute: &str) -> bool {
        if let Some((type_glob, title_glob)) = &self.scope {
            if !type_glob.matches(&key.type_name) || !title_glob.matches(&key.title) {
                return false;
            }
        }
        self.attribute.matches(attribute)
    }
}

/// Compares the attributes of two resources that share an identity key
#[derive(Debug, Clone, Default)]
pub struct AttributeComparator {
    ignore_rules: Vec<IgnoreRule>,
    compare_file_line: bool,
}

impl AttributeComparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the ignore-attribute rules; any invalid glob fails the whole set
    pub fn with_ignore_rules<S: AsRef<str>>(mut self, rules: &[S]) -> Result<Self, CatDiffError> {
        self.ignore_rules = rules
            .iter()
            .map(|rule| IgnoreRule::parse(rule.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self)
    }

    pub fn with_file_line(mut self, enabled: bool) -> Self {
        self.compare_file_line = enabled;
        self
    }

    pub fn is_ignored(&self, key: &ResourceKey, attribute: &str) -> bool {
        self.ignore_rules.iter().any(|rule| rule.matches(key, attribute))
    }

    /// Attribute-level entries for a matched pair, ordered by attribute name,
    /// followed by context entries when file/line comparison is enabled.
    pub fn compare(&self, from: &Resource, to: &Resource) -> Vec<DiffEntry> {
        let key = identity_key(from);
        let mut entries = Vec::new();

        let names: BTreeSet<&String> = from.attributes.keys().chain(to.attributes.keys()).collect();

        for name in names {
            if self.is_ignored(&key, name) {
                continue;
            }

            let old = from.attributes.get(name);
            let new = to.attributes.get(name);
            let kind = match (old, new) {
                (Some(old), Some(new)) if old == new => continue,
                (Some(_), Some(_)) => DiffKind::Changed,
                (Some(_), None) => DiffKind::Removed,
                (None, Some(_)) => DiffKind::Added,
                (None, None) => continue,
            };

            entries.push(DiffEntry {
                kind,
                resource: key.clone(),
                path: DiffPath::Attribute(name.clone()),
                old_value: old.cloned(),
                new_value: new.cloned(),
            });
        }

        if self.compare_file_line {
            let file = |r: &Resource| r.file().map(AttrValue::from);
            let line = |r: &Resource| r.line().map(AttrValue::from);

            push_context(&mut entries, &key, ContextField::File, file(from), file(to));
            push_context(&mut entries, &key, ContextField::Line, line(from), line(to));
        }

        entries
    }
}

fn push_context(
    entries: &mut Vec<DiffEntry>,
    key: &ResourceKey,
    field: ContextField,
    old: Option<AttrValue>,
    new: Option<AttrValue>,
) {
    if old == new {
        return;
    }
    entries.push(DiffEntry {
        kind: DiffKind::ChangedContext,
        resource: key.clone(),
        path: DiffPath::Context(field),
        old_value: old,
        new_value: new,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motd(mode: &str) -> Resource {
        Resource::new("File", "/etc/motd")
            .with_attribute("ensure", "file")
            .with_attribute("mode", mode)
            .with_attribute("content", "hello")
    }

    #[test]
    fn test_identical_resources_produce_nothing() {
        let comparator = AttributeComparator::new();
        assert!(comparator.compare(&motd("0644"), &motd("0644")).is_empty());
    }

    #[test]
    fn test_single_changed_attribute() {
        let entries = AttributeComparator::new().compare(&motd("0644"), &motd("0600"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, DiffKind::Changed);
        assert_eq!(entries[0].identity(), "File[/etc/motd] -> mode");
        assert_eq!(entries[0].old_value, Some(AttrValue::from("0644")));
        assert_eq!(entries[0].new_value, Some(AttrValue::from("0600")));
    }

    #[test]
    fn test_added_and_removed_attributes() {
        let from = motd("0644").with_attribute("owner", "root");
        let to = motd("0644").with_attribute("group", "wheel");

        let entries = AttributeComparator::new().compare(&from, &to);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].kind, DiffKind::Added);
        assert_eq!(entries[0].path, DiffPath::Attribute("group".to_string()));
        assert!(entries[0].old_value.is_none());
        assert_eq!(entries[0].new_value, Some(AttrValue::from("wheel")));

        assert_eq!(entries[1].kind, DiffKind::Removed);
        assert_eq!(entries[1].path, DiffPath::Attribute("owner".to_string()));
        assert_eq!(entries[1].old_value, Some(AttrValue::from("root")));
        assert!(entries[1].new_value.is_none());
    }

    #[test]
    fn test_nested_values_compare_structurally() {
        let from: AttrValue = serde_json::from_str(r#"{"a": [1, 2], "b": {"c": "d"}}"#).unwrap();
        let same: AttrValue = serde_json::from_str(r#"{"b": {"c": "d"}, "a": [1, 2]}"#).unwrap();
        let reordered: AttrValue = serde_json::from_str(r#"{"a": [2, 1], "b": {"c": "d"}}"#).unwrap();

        let base = Resource::new("Exec", "x").with_attribute("env", from);
        let comparator = AttributeComparator::new();

        assert!(comparator
            .compare(&base, &Resource::new("Exec", "x").with_attribute("env", same))
            .is_empty());
        assert_eq!(
            comparator
                .compare(&base, &Resource::new("Exec", "x").with_attribute("env", reordered))
                .len(),
            1
        );
    }

    #[test]
    fn test_no_type_coercion() {
        let from = Resource::new("Service", "sshd").with_attribute("port", 22i64);
        let to = Resource::new("Service", "sshd").with_attribute("port", "22");
        let entries = AttributeComparator::new().compare(&from, &to);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, DiffKind::Changed);
    }

    #[test]
    fn test_ignored_attributes_are_skipped() {
        let comparator = AttributeComparator::new()
            .with_ignore_rules(&["mode", "File[/etc/*]::content"])
            .unwrap();

        let from = motd("0644").with_attribute("content", "a");
        let to = motd("0600").with_attribute("content", "b");
        assert!(comparator.compare(&from, &to).is_empty());

        let other_from = Resource::new("File", "/srv/motd").with_attribute("content", "a");
        let other_to = Resource::new("File", "/srv/motd").with_attribute("content", "b");
        assert_eq!(comparator.compare(&other_from, &other_to).len(), 1);
    }

    #[test]
    fn test_ignore_rule_parsing() {
        let key = ResourceKey::new("Mymodule::Resource1", "one");
        assert!(IgnoreRule::parse("Mymodule::*[one]::notify").unwrap().matches(&key, "notify"));
        assert!(IgnoreRule::parse("*_path").unwrap().matches(&key, "config_path"));
        assert!(!IgnoreRule::parse("*_path").unwrap().matches(&key, "path_config"));
        assert!(!IgnoreRule::parse("File[*]::notify").unwrap().matches(&key, "notify"));

        assert!(matches!(IgnoreRule::parse(""), Err(CatDiffError::InvalidPattern(_))));
        assert!(matches!(IgnoreRule::parse("[unclosed"), Err(CatDiffError::InvalidPattern(_))));
        assert!(matches!(IgnoreRule::parse("File]::mode"), Err(CatDiffError::InvalidPattern(_))));
    }

    #[test]
    fn test_file_line_context_entries() {
        let from = motd("0644").with_source("/modules/motd/manifests/init.pp", 7);
        let to = motd("0644").with_source("/modules/motd/manifests/init.pp", 9);

        assert!(AttributeComparator::new().compare(&from, &to).is_empty());

        let entries = AttributeComparator::new().with_file_line(true).compare(&from, &to);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, DiffKind::ChangedContext);
        assert_eq!(entries[0].path, DiffPath::Context(ContextField::Line));
        assert_eq!(entries[0].old_value, Some(AttrValue::Integer(7)));
        assert_eq!(entries[0].new_value, Some(AttrValue::Integer(9)));
    }

    #[test]
    fn test_context_kept_apart_from_value_changes() {
        let from = motd("0644").with_source("/a.pp", 1);
        let to = motd("0600").with_source("/b.pp", 1);

        let entries = AttributeComparator::new().with_file_line(true).compare(&from, &to);
        let kinds: Vec<DiffKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![DiffKind::Changed, DiffKind::ChangedContext]);
        assert_eq!(entries[1].identity(), "File[/etc/motd] @ file");
    }

    #[test]
    fn test_large_unsigned_values_are_compared_exactly() {
        let from: AttrValue = serde_json::from_str("18446744073709551615").unwrap();
        let to: AttrValue = serde_json::from_str("18446744073709551614").unwrap();

        let entries = AttributeComparator::new().compare(
            &Resource::new("Sysctl", "kernel.shmmax").with_attribute("value", from.clone()),
            &Resource::new("Sysctl", "kernel.shmmax").with_attribute("value", to.clone()),
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, DiffKind::Changed);
        assert_eq!(entries[0].old_value, Some(from));
        assert_eq!(entries[0].new_value, Some(to));
    }

    #[test]
    fn test_huge_line_numbers_do_not_wrap() {
        let from = motd("0644").with_source("/a.pp", u64::MAX);
        let to = motd("0644").with_source("/a.pp", 1);

        let entries = AttributeComparator::new().with_file_line(true).compare(&from, &to);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].old_value, Some(AttrValue::UInteger(u64::MAX)));
        assert_eq!(entries[0].new_value, Some(AttrValue::Integer(1)));
    }

    #[test]
    fn test_line_attribute_and_line_context_have_distinct_identities() {
        let from = Resource::new("File_line", "x")
            .with_attribute("line", "foo")
            .with_source("/a.pp", 3);
        let to = Resource::new("File_line", "x")
            .with_attribute("line", "bar")
            .with_source("/a.pp", 4);

        let entries = AttributeComparator::new().with_file_line(true).compare(&from, &to);
        let identities: Vec<String> = entries.iter().map(DiffEntry::identity).collect();
        assert_eq!(identities, vec!["File_line[x] -> line", "File_line[x] @ line"]);
    }
}
