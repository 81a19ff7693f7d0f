//! Feature ID hierarchy
//!
//! IDs are slash-delimited paths (`amenity/restaurant/pizza`). Two different
//! truncations are derived from them and both live here:
//! - the **parent** is everything before the last `/`
//! - the **group key** is everything before the first `/`, and is what the
//!   tag index treats as a significant tag key

use crate::registry::{Catalogue, FeatureDefinition};

/// Parent ID of `id`, or `None` for a top-level ID
pub fn parent_id(id: &str) -> Option<&str> {
    id.rfind('/').map(|pos| &id[..pos])
}

/// Top-level segment of `id`
pub fn group_key(id: &str) -> &str {
    match id.find('/') {
        Some(pos) => &id[..pos],
        None => id,
    }
}

/// Ancestors of `id`, starting with `id` itself
pub fn lineage(id: &str) -> impl Iterator<Item = &str> {
    let mut next = Some(id);
    std::iter::from_fn(move || {
        let current = next?;
        next = parent_id(current);
        Some(current)
    })
}

/// Walk from `id` up the hierarchy and return the first value `getter`
/// produces. IDs missing from `catalogue` are skipped, not terminal.
pub fn resolve_inherited<T, F>(catalogue: &Catalogue, id: Option<&str>, getter: F) -> Option<T>
where
    F: Fn(&FeatureDefinition) -> Option<T>,
{
    lineage(id?)
        .filter_map(|current| catalogue.get(current))
        .find_map(|feature| getter(feature.as_ref()))
}
