//! Country and region boundaries for country-code location rules

use std::collections::HashMap;
use std::sync::Arc;

use geo::{Contains, Point};
use serde_json::Value;

use super::parse_geometry;
use crate::error::{PresetError, Result};
use crate::value::ValueExt;

/// Answers whether a country or region code contains a point
///
/// `None` means the code is unknown to the provider.
pub trait BoundaryProvider: Send + Sync {
    fn contains(&self, code: &str, point: &Point<f64>) -> Option<bool>;
}

/// Provider that knows no codes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBoundaries;

impl BoundaryProvider for NoBoundaries {
    fn contains(&self, _code: &str, _point: &Point<f64>) -> Option<bool> {
        None
    }
}

/// Property names whose values identify a boundary
const CODE_PROPERTIES: [&str; 5] = ["id", "iso1A2", "iso1A3", "iso1N3", "m49"];

/// In-memory boundaries keyed case-insensitively by code
#[derive(Debug, Clone, Default)]
pub struct BoundaryTable {
    geometries: Vec<Arc<geo::Geometry<f64>>>,
    by_code: HashMap<String, usize>,
}

impl BoundaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a geometry under one or more codes
    pub fn insert<I, S>(&mut self, codes: I, geometry: geo::Geometry<f64>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let slot = self.geometries.len();
        self.geometries.push(Arc::new(geometry));
        for code in codes {
            self.by_code.insert(code.as_ref().to_lowercase(), slot);
        }
    }

    /// Build from a geoJSON `FeatureCollection` whose feature properties
    /// carry `id`, `iso1A2`, `iso1A3`, `iso1N3` or `m49` codes
    ///
    /// Features without geometry or without any code are skipped.
    pub fn from_feature_collection(document: &Value) -> Result<Self> {
        let features = document
            .get("features")
            .ok_or_else(|| PresetError::InvalidDocument {
                name: "boundaries".to_string(),
                reason: "missing 'features' array".to_string(),
            })?
            .as_array_checked("boundaries.features")?;

        let mut table = Self::new();
        for feature in features {
            let Some(geometry) = feature.get("geometry").and_then(parse_geometry) else {
                continue;
            };
            let codes: Vec<&str> = feature
                .get("properties")
                .map(|properties| {
                    CODE_PROPERTIES
                        .iter()
                        .filter_map(|name| properties.get(*name).and_then(Value::as_str))
                        .collect()
                })
                .unwrap_or_default();
            if !codes.is_empty() {
                table.insert(codes, geometry);
            }
        }
        Ok(table)
    }

    pub fn geometry(&self, code: &str) -> Option<&geo::Geometry<f64>> {
        self.by_code
            .get(&code.to_lowercase())
            .and_then(|slot| self.geometries.get(*slot))
            .map(Arc::as_ref)
    }

    /// Number of distinct geometries
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

impl BoundaryProvider for BoundaryTable {
    fn contains(&self, code: &str, point: &Point<f64>) -> Option<bool> {
        self.geometry(code).map(|geometry| geometry.contains(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Geometry};
    use serde_json::json;

    #[test]
    fn test_codes_are_case_insensitive() {
        let mut table = BoundaryTable::new();
        table.insert(
            ["DE", "deu"],
            Geometry::Polygon(polygon![
                (x: 5.9, y: 47.3),
                (x: 15.0, y: 47.3),
                (x: 15.0, y: 55.0),
                (x: 5.9, y: 55.0),
            ]),
        );

        let berlin = Point::new(13.4, 52.5);
        assert_eq!(table.contains("de", &berlin), Some(true));
        assert_eq!(table.contains("DEU", &berlin), Some(true));
        assert_eq!(table.contains("de", &Point::new(2.35, 48.85)), Some(false));
        assert_eq!(table.contains("fr", &berlin), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_from_feature_collection() {
        let table = BoundaryTable::from_feature_collection(&json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"id": "Q183", "iso1A2": "DE", "iso1A3": "DEU", "iso1N3": "276"},
                    "geometry": {"type": "Polygon", "coordinates": [[[5.9, 47.3], [15.0, 47.3], [15.0, 55.0], [5.9, 55.0], [5.9, 47.3]]]}
                },
                {"type": "Feature", "properties": {"iso1A2": "XX"}, "geometry": null},
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}}
            ]
        }))
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.contains("276", &Point::new(10.0, 50.0)), Some(true));
        assert_eq!(table.contains("xx", &Point::new(10.0, 50.0)), None);
    }

    #[test]
    fn test_no_boundaries_knows_nothing() {
        assert_eq!(NoBoundaries.contains("de", &Point::new(13.4, 52.5)), None);
    }
}
