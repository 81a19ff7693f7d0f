//! Location-set admission
//!
//! A feature without a location set is valid everywhere. Otherwise it is
//! admitted when any rule of its `include` list admits the point.

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PresetError;
use crate::region::{BoundaryProvider, RegionSet};
use crate::registry::{FeatureDefinition, LocationRule};

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// As a `geo` point (`x` = longitude, `y` = latitude)
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/// Evaluates location rules against the boundary provider and the
/// currently published regions
pub struct LocationFilter<'a> {
    boundaries: &'a dyn BoundaryProvider,
    regions: &'a RegionSet,
}

impl<'a> LocationFilter<'a> {
    pub fn new(boundaries: &'a dyn BoundaryProvider, regions: &'a RegionSet) -> Self {
        Self { boundaries, regions }
    }

    /// Whether `feature` is valid at `location`
    pub fn admits(&self, feature: &FeatureDefinition, location: LatLon) -> bool {
        let Some(set) = &feature.location_set else {
            return true;
        };
        let point = location.to_point();
        set.include
            .iter()
            .any(|rule| self.rule_admits(&feature.id, rule, &point))
    }

    fn rule_admits(&self, feature_id: &str, rule: &LocationRule, point: &Point<f64>) -> bool {
        match rule {
            LocationRule::Worldwide => true,
            LocationRule::CountryCode(code) => match self.boundaries.contains(code, point) {
                Some(inside) => {
                    if inside {
                        debug!(feature = feature_id, code = %code, "admitted by country code");
                    }
                    inside
                }
                None => {
                    warn!(feature = feature_id, code = %code, "unknown country code");
                    false
                }
            },
            LocationRule::GeoJson(name) => {
                let inside = self.regions.contains(name, point);
                if inside {
                    debug!(feature = feature_id, region = %name, "admitted by region");
                }
                inside
            }
            LocationRule::Circle { lon, lat, radius } => {
                Point::new(*lon, *lat).haversine_distance(point) <= *radius
            }
            LocationRule::Unrecognized(raw) => {
                let err = PresetError::UnrecognizedLocationRule {
                    feature_id: feature_id.to_string(),
                    rule: raw.to_string(),
                };
                warn!(error = %err, "location rule ignored");
                false
            }
        }
    }
}
