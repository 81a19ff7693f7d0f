//! Tag Index
//!
//! Inverted index from tag key to the features that carry it. Only
//! *significant* keys are indexed: keys that are the top-level ID segment of
//! some base feature (`amenity` for `amenity/cafe`). Features with no
//! significant key are filed under the catch-all key `""`.
//!
//! A feature with several significant keys is listed under each of them.
//! Callers that need uniqueness must de-duplicate by feature identity.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::hierarchy::group_key;
use crate::registry::{Catalogue, FeatureDefinition};

/// Bucket for features sharing no significant key
pub const CATCH_ALL_KEY: &str = "";

/// Significant key → number of base features grouped under it
pub fn significant_keys(base: &Catalogue) -> HashMap<&str, usize> {
    let mut keys: HashMap<&str, usize> = HashMap::new();
    for id in base.keys() {
        *keys.entry(group_key(id)).or_default() += 1;
    }
    keys
}

/// Immutable tag key → candidate features index
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    buckets: IndexMap<String, Vec<Arc<FeatureDefinition>>>,
}

impl TagIndex {
    /// Index every feature of `catalogues`, in order, against the
    /// significant keys of `base`
    pub fn build(catalogues: &[&Catalogue], base: &Catalogue) -> Self {
        let keys = significant_keys(base);
        let mut buckets: IndexMap<String, Vec<Arc<FeatureDefinition>>> = IndexMap::new();

        for catalogue in catalogues {
            for feature in catalogue.values() {
                let mut added = false;
                for key in feature.tags.keys() {
                    if keys.contains_key(key.as_str()) {
                        buckets.entry(key.clone()).or_default().push(Arc::clone(feature));
                        added = true;
                    }
                }
                if !added {
                    buckets
                        .entry(CATCH_ALL_KEY.to_string())
                        .or_default()
                        .push(Arc::clone(feature));
                }
            }
        }

        Self { buckets }
    }

    /// Features filed under `key`, in build order
    pub fn candidates(&self, key: &str) -> &[Arc<FeatureDefinition>] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Indexed keys, in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Number of keys with at least one feature
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total entries across buckets, duplicates included
    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::load_catalogue;
    use serde_json::json;

    fn base() -> Catalogue {
        load_catalogue(
            &json!({
                "amenity": {"tags": {"amenity": "*"}, "geometry": ["point"]},
                "amenity/cafe": {"tags": {"amenity": "cafe"}, "geometry": ["point"]},
                "shop/bakery": {"tags": {"shop": "bakery"}, "geometry": ["point"]},
                "amenity/cafe_shop": {"tags": {"amenity": "cafe", "shop": "coffee"}, "geometry": ["point"]},
                "point": {"tags": {}, "geometry": ["point"]},
                "address": {"tags": {"addr:*": "*"}, "geometry": ["point"]}
            }),
            None,
            false,
        )
        .unwrap()
    }

    fn ids(features: &[Arc<FeatureDefinition>]) -> Vec<&str> {
        features.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_significant_keys_count_group_prefixes() {
        let base = base();
        let keys = significant_keys(&base);
        assert_eq!(keys.get("amenity"), Some(&3));
        assert_eq!(keys.get("shop"), Some(&1));
        assert_eq!(keys.get("point"), Some(&1));
        assert!(keys.get("cuisine").is_none());
    }

    #[test]
    fn test_features_filed_per_significant_key() {
        let base = base();
        let index = TagIndex::build(&[&base], &base);

        assert_eq!(
            ids(index.candidates("amenity")),
            vec!["amenity", "amenity/cafe", "amenity/cafe_shop"]
        );
        assert_eq!(ids(index.candidates("shop")), vec!["shop/bakery", "amenity/cafe_shop"]);
    }

    #[test]
    fn test_no_significant_key_goes_to_catch_all() {
        let base = base();
        let index = TagIndex::build(&[&base], &base);
        assert_eq!(ids(index.candidates(CATCH_ALL_KEY)), vec!["point", "address"]);
        assert!(index.candidates("cuisine").is_empty());
    }

    #[test]
    fn test_completeness() {
        let base = base();
        let index = TagIndex::build(&[&base], &base);
        let keys = significant_keys(&base);

        for feature in base.values() {
            let filed: Vec<&str> = feature
                .tags
                .keys()
                .map(String::as_str)
                .filter(|k| keys.contains_key(k))
                .collect();
            if filed.is_empty() {
                assert!(index.candidates(CATCH_ALL_KEY).iter().any(|f| Arc::ptr_eq(f, feature)));
            } else {
                for key in filed {
                    assert!(index.candidates(key).iter().any(|f| Arc::ptr_eq(f, feature)));
                }
            }
        }
        assert_eq!(index.entry_count(), 7);
    }

    #[test]
    fn test_combined_uses_base_significant_keys() {
        let base = base();
        let supplementary = load_catalogue(
            &json!({
                "amenity/cafe/starbucks": {"tags": {"amenity": "cafe", "brand": "Starbucks"}, "geometry": ["point"]},
                "brand/only": {"tags": {"brand": "Only"}, "geometry": ["point"]}
            }),
            None,
            true,
        )
        .unwrap();

        let index = TagIndex::build(&[&base, &supplementary], &base);
        assert_eq!(
            ids(index.candidates("amenity")),
            vec!["amenity", "amenity/cafe", "amenity/cafe_shop", "amenity/cafe/starbucks"]
        );
        assert!(index.candidates("brand").is_empty());
        assert_eq!(ids(index.candidates(CATCH_ALL_KEY)), vec!["point", "address", "brand/only"]);
    }
}
