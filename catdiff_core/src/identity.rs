use catdiff_common::{CatDiffError, Resource, ResourceKey, Result};

/// The key used to match a resource across two catalogs.
///
/// Two resources are the same logical resource iff their keys are equal.
pub fn identity_key(resource: &Resource) -> ResourceKey {
    resource.key()
}

/// Parse a `Type[title]` reference as used by catalog edges
pub fn parse_reference(reference: &str) -> Result<ResourceKey> {
    let malformed = || CatDiffError::MalformedCatalog(format!("Invalid resource reference: '{}'", reference));

    let (type_name, rest) = reference.split_once('[').ok_or_else(malformed)?;
    let title = rest.strip_suffix(']').ok_or_else(malformed)?;

    let type_name = type_name.trim();
    if type_name.is_empty() || title.is_empty() {
        return Err(malformed());
    }

    Ok(ResourceKey::new(type_name, title))
}
