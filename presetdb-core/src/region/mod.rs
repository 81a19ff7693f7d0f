//! Named regions for geoJSON location rules
//!
//! The region dataset is a geoJSON `FeatureCollection`. Only entries with
//! `"type": "Feature"`, a string `id` and a geometry that converts to a
//! [`geo::Geometry`] are kept; everything else is skipped silently. Region
//! names are the feature IDs, e.g. `"de-berlin.geojson"`.
//!
//! Coordinates follow geoJSON: `x` is longitude, `y` is latitude.

mod boundary;

use std::collections::HashMap;

use geo::{Contains, Point};
use serde_json::Value;
use tracing::debug;

pub use boundary::{BoundaryProvider, BoundaryTable, NoBoundaries};

use crate::error::{PresetError, Result};
use crate::value::ValueExt;

/// Parse a geoJSON geometry object into a `geo` geometry
pub(crate) fn parse_geometry(value: &Value) -> Option<geo::Geometry<f64>> {
    let geometry = geojson::Geometry::from_json_value(value.clone()).ok()?;
    geo::Geometry::<f64>::try_from(geometry).ok()
}

/// A named geometry
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRegion {
    pub name: String,
    pub geometry: geo::Geometry<f64>,
}

impl GeoRegion {
    pub fn new(name: impl Into<String>, geometry: geo::Geometry<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.geometry.contains(point)
    }
}

/// Region name → region
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    regions: HashMap<String, GeoRegion>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a geoJSON `FeatureCollection` document
    pub fn from_feature_collection(document: &Value) -> Result<Self> {
        let root = document.as_object_checked("regions")?;
        let features = root
            .get("features")
            .ok_or_else(|| PresetError::InvalidDocument {
                name: "regions".to_string(),
                reason: "missing 'features' array".to_string(),
            })?
            .as_array_checked("regions.features")?;

        let mut regions = HashMap::with_capacity(features.len());
        let mut skipped = 0usize;
        for entry in features {
            let region = (entry.get("type").and_then(Value::as_str) == Some("Feature"))
                .then(|| {
                    let name = entry.get("id").and_then(Value::as_str)?;
                    let geometry = entry.get("geometry").and_then(parse_geometry)?;
                    Some(GeoRegion::new(name, geometry))
                })
                .flatten();

            match region {
                Some(region) => {
                    regions.insert(region.name.clone(), region);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(kept = regions.len(), skipped, "skipped region entries");
        }
        Ok(Self { regions })
    }

    pub fn insert(&mut self, region: GeoRegion) {
        self.regions.insert(region.name.clone(), region);
    }

    pub fn get(&self, name: &str) -> Option<&GeoRegion> {
        self.regions.get(name)
    }

    /// Whether region `name` exists and contains `point`
    pub fn contains(&self, name: &str, point: &Point<f64>) -> bool {
        self.get(name).is_some_and(|region| region.contains(point))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(lon: f64, lat: f64, half: f64) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [lon - half, lat - half],
                [lon + half, lat - half],
                [lon + half, lat + half],
                [lon - half, lat + half],
                [lon - half, lat - half]
            ]]
        })
    }

    #[test]
    fn test_feature_collection_filtering() {
        let regions = RegionSet::from_feature_collection(&json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": "berlin.geojson", "geometry": square(13.4, 52.5, 0.3), "properties": {}},
                {"type": "Feature", "geometry": square(0.0, 0.0, 1.0)},
                {"type": "Feature", "id": 7, "geometry": square(0.0, 0.0, 1.0)},
                {"type": "Other", "id": "other.geojson", "geometry": square(0.0, 0.0, 1.0)},
                {"type": "Feature", "id": "broken.geojson", "geometry": {"type": "Polygon"}}
            ]
        }))
        .unwrap();

        assert_eq!(regions.len(), 1);
        assert!(regions.contains("berlin.geojson", &Point::new(13.4, 52.5)));
        assert!(!regions.contains("berlin.geojson", &Point::new(2.35, 48.85)));
        assert!(!regions.contains("other.geojson", &Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_multipolygon_region() {
        let geometry = parse_geometry(&json!({
            "type": "MultiPolygon",
            "coordinates": [
                square(0.0, 0.0, 1.0)["coordinates"].clone(),
                square(10.0, 10.0, 1.0)["coordinates"].clone()
            ]
        }))
        .unwrap();
        let region = GeoRegion::new("pair.geojson", geometry);
        assert!(region.contains(&Point::new(10.2, 9.8)));
        assert!(!region.contains(&Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_malformed_collection() {
        assert!(RegionSet::from_feature_collection(&json!([])).is_err());
        assert!(RegionSet::from_feature_collection(&json!({"type": "FeatureCollection"})).is_err());
    }
}
