//! Published catalogue snapshots
//!
//! A [`CatalogueSnapshot`] is immutable. Background tasks build replacement
//! facets off to the side and publish a new snapshot through
//! [`SnapshotCell`], which shares every untouched facet with the previous
//! one. Readers take an `Arc` and never block.
//!
//! The two publishes touch disjoint facets (supplementary + combined index,
//! regions), so they commute. Each facet's loader may be claimed once per
//! cell, which keeps every facet published at most once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::index::TagIndex;
use crate::region::RegionSet;
use crate::registry::{Catalogue, FeatureDefinition};

#[derive(Debug, Clone)]
pub struct CatalogueSnapshot {
    base: Arc<Catalogue>,
    supplementary: Arc<Catalogue>,
    base_index: Arc<TagIndex>,
    combined_index: Arc<TagIndex>,
    regions: Arc<RegionSet>,
}

impl CatalogueSnapshot {
    /// Initial snapshot: no supplementary features, no regions, and the
    /// combined index is the base index
    pub fn from_base(base: Arc<Catalogue>) -> Self {
        let base_index = Arc::new(TagIndex::build(&[base.as_ref()], &base));
        Self {
            base,
            supplementary: Arc::new(Catalogue::new()),
            combined_index: Arc::clone(&base_index),
            base_index,
            regions: Arc::new(RegionSet::new()),
        }
    }

    /// Copy with the supplementary facet replaced
    pub fn with_supplementary(&self, supplementary: Arc<Catalogue>, combined_index: Arc<TagIndex>) -> Self {
        Self {
            supplementary,
            combined_index,
            ..self.clone()
        }
    }

    /// Copy with the region facet replaced
    pub fn with_regions(&self, regions: Arc<RegionSet>) -> Self {
        Self {
            regions,
            ..self.clone()
        }
    }

    pub fn base(&self) -> &Arc<Catalogue> {
        &self.base
    }

    pub fn supplementary(&self) -> &Arc<Catalogue> {
        &self.supplementary
    }

    pub fn regions(&self) -> &Arc<RegionSet> {
        &self.regions
    }

    /// Combined index when `include_supplementary`, else the base index
    pub fn index(&self, include_supplementary: bool) -> &Arc<TagIndex> {
        if include_supplementary {
            &self.combined_index
        } else {
            &self.base_index
        }
    }

    /// Look up a feature, base catalogue first
    pub fn feature(&self, id: &str) -> Option<&Arc<FeatureDefinition>> {
        self.base.get(id).or_else(|| self.supplementary.get(id))
    }

    pub fn base_features(&self) -> impl Iterator<Item = &Arc<FeatureDefinition>> {
        self.base.values()
    }

    /// Base features followed by supplementary features
    pub fn all_features(&self) -> impl Iterator<Item = &Arc<FeatureDefinition>> {
        self.base.values().chain(self.supplementary.values())
    }

    pub fn has_supplementary(&self) -> bool {
        !self.supplementary.is_empty()
    }

    pub fn has_regions(&self) -> bool {
        !self.regions.is_empty()
    }
}

/// Atomically swappable current snapshot
#[derive(Debug)]
pub struct SnapshotCell {
    current: ArcSwap<CatalogueSnapshot>,
    supplementary_claimed: AtomicBool,
    regions_claimed: AtomicBool,
}

impl SnapshotCell {
    pub fn new(snapshot: CatalogueSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
            supplementary_claimed: AtomicBool::new(false),
            regions_claimed: AtomicBool::new(false),
        }
    }

    /// Claim the supplementary loader; true only for the first caller
    pub fn claim_supplementary(&self) -> bool {
        !self.supplementary_claimed.swap(true, Ordering::AcqRel)
    }

    /// Claim the region loader; true only for the first caller
    pub fn claim_regions(&self) -> bool {
        !self.regions_claimed.swap(true, Ordering::AcqRel)
    }

    /// The currently published snapshot
    pub fn load(&self) -> Arc<CatalogueSnapshot> {
        self.current.load_full()
    }

    pub fn publish_supplementary(&self, supplementary: Arc<Catalogue>, combined_index: Arc<TagIndex>) {
        let features = supplementary.len();
        self.current.rcu(|old| {
            Arc::new(old.with_supplementary(Arc::clone(&supplementary), Arc::clone(&combined_index)))
        });
        info!(features, "published supplementary catalogue");
    }

    pub fn publish_regions(&self, regions: Arc<RegionSet>) {
        let count = regions.len();
        self.current
            .rcu(|old| Arc::new(old.with_regions(Arc::clone(&regions))));
        info!(regions = count, "published region dataset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::GeoRegion;
    use crate::registry::{load_catalogue, load_supplementary_catalogue};
    use geo::{point, Geometry};
    use serde_json::json;

    fn base() -> Arc<Catalogue> {
        Arc::new(
            load_catalogue(
                &json!({"amenity/cafe": {"tags": {"amenity": "cafe"}, "geometry": ["point"]}}),
                None,
                false,
            )
            .unwrap(),
        )
    }

    fn supplementary() -> Arc<Catalogue> {
        Arc::new(
            load_supplementary_catalogue(&json!({"presets": {
                "amenity/cafe/starbucks": {"tags": {"amenity": "cafe", "brand": "Starbucks"}, "geometry": ["point"]}
            }}))
            .unwrap(),
        )
    }

    #[test]
    fn test_initial_snapshot() {
        let snapshot = CatalogueSnapshot::from_base(base());
        assert!(!snapshot.has_supplementary());
        assert!(!snapshot.has_regions());
        assert!(Arc::ptr_eq(snapshot.index(true), snapshot.index(false)));
        assert_eq!(snapshot.all_features().count(), 1);
    }

    #[test]
    fn test_publishes_share_untouched_facets() {
        let base = base();
        let cell = SnapshotCell::new(CatalogueSnapshot::from_base(Arc::clone(&base)));
        let before = cell.load();

        let supp = supplementary();
        let combined = Arc::new(TagIndex::build(&[base.as_ref(), supp.as_ref()], &base));
        cell.publish_supplementary(supp, combined);

        let mut regions = RegionSet::new();
        regions.insert(GeoRegion::new("dot.geojson", Geometry::Point(point!(x: 0.0, y: 0.0))));
        cell.publish_regions(Arc::new(regions));

        let after = cell.load();
        assert!(after.has_supplementary());
        assert!(after.has_regions());
        assert!(Arc::ptr_eq(after.base(), before.base()));
        assert!(Arc::ptr_eq(after.index(false), before.index(false)));
        assert_eq!(after.index(true).candidates("amenity").len(), 2);

        assert!(!before.has_supplementary());
        assert_eq!(after.feature("amenity/cafe/starbucks").map(|f| f.is_supplementary), Some(true));
        assert_eq!(after.all_features().count(), 2);
        assert_eq!(after.base_features().count(), 1);
    }
}
