//! Feature definitions (presets)

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{PresetError, Result};
use crate::hierarchy;

/// Tag set of an entity or a preset. Sorted so iteration is deterministic.
pub type Tags = BTreeMap<String, String>;

/// Location rule code that admits every location
pub const WORLDWIDE_CODE: &str = "001";

/// Radius used by circle rules that omit one, in meters
pub const DEFAULT_CIRCLE_RADIUS: f64 = 25_000.0;

/// Kind of geometry an entity has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Point,
    Vertex,
    Line,
    Area,
    Relation,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 5] = [
        GeometryKind::Point,
        GeometryKind::Vertex,
        GeometryKind::Line,
        GeometryKind::Area,
        GeometryKind::Relation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::Vertex => "vertex",
            GeometryKind::Line => "line",
            GeometryKind::Area => "area",
            GeometryKind::Relation => "relation",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryKind {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self> {
        GeometryKind::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| PresetError::UnknownGeometry {
                value: s.to_string(),
            })
    }
}

/// One entry of a location set's `include` list
#[derive(Debug, Clone, PartialEq)]
pub enum LocationRule {
    /// `"001"`: valid everywhere
    Worldwide,
    /// ISO country or region code, resolved by a boundary provider
    CountryCode(String),
    /// Name of a region in the geoJSON dataset (ends in `.geojson`)
    GeoJson(String),
    /// `[lon, lat, radius?]`, radius in meters
    Circle { lon: f64, lat: f64, radius: f64 },
    /// Anything else; never admits
    Unrecognized(Value),
}

impl LocationRule {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(code) if code == WORLDWIDE_CODE => LocationRule::Worldwide,
            Value::String(name) if name.ends_with(".geojson") => LocationRule::GeoJson(name.clone()),
            Value::String(code) => LocationRule::CountryCode(code.clone()),
            Value::Array(numbers) if (2..=3).contains(&numbers.len()) => {
                let parsed: Option<Vec<f64>> = numbers.iter().map(Value::as_f64).collect();
                match parsed {
                    Some(n) => LocationRule::Circle {
                        lon: n[0],
                        lat: n[1],
                        radius: n.get(2).copied().unwrap_or(DEFAULT_CIRCLE_RADIUS),
                    },
                    None => LocationRule::Unrecognized(value.clone()),
                }
            }
            other => LocationRule::Unrecognized(other.clone()),
        }
    }
}

/// Where a feature is valid; rules are combined with OR
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSet {
    pub include: Vec<LocationRule>,
}

/// A catalogued preset
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDefinition {
    /// Slash-delimited hierarchical ID, e.g. `amenity/restaurant/pizza`
    pub id: String,
    /// Localized display name
    pub name: Option<String>,
    /// Tags that define the feature
    pub tags: Tags,
    /// Tags applied when the preset is chosen; defaults to `tags`
    pub add_tags: Tags,
    /// Tags removed when the preset is dropped; defaults to `add_tags`
    pub remove_tags: Tags,
    /// Geometry kinds this preset applies to
    pub geometry: Vec<GeometryKind>,
    /// Field IDs; `None` means inherit from the parent
    pub fields: Option<Vec<String>>,
    /// Extra field IDs; `None` means inherit from the parent
    pub more_fields: Option<Vec<String>>,
    pub icon: Option<String>,
    /// Search synonyms
    pub terms: Vec<String>,
    /// Alternative names
    pub aliases: Vec<String>,
    pub searchable: bool,
    /// Weight of each matched tag
    pub match_score: f64,
    pub location_set: Option<LocationSet>,
    pub reference: Option<Value>,
    pub replacement: Option<String>,
    /// Sourced from the supplementary (brand/name) catalogue
    pub is_supplementary: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocationSet {
    #[serde(default)]
    include: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPreset {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tags: Tags,
    #[serde(default)]
    add_tags: Option<Tags>,
    #[serde(default)]
    remove_tags: Option<Tags>,
    #[serde(default, deserialize_with = "geometry_list")]
    geometry: Vec<GeometryKind>,
    #[serde(default)]
    fields: Option<Vec<String>>,
    #[serde(default)]
    more_fields: Option<Vec<String>>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    terms: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    aliases: Vec<String>,
    #[serde(default = "default_searchable")]
    searchable: bool,
    #[serde(default = "default_match_score")]
    match_score: f64,
    #[serde(default)]
    location_set: Option<RawLocationSet>,
    #[serde(default)]
    reference: Option<Value>,
    #[serde(default)]
    replacement: Option<String>,
}

/// Terms and aliases are arrays in base documents but comma or newline
/// separated strings in translations.
fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringList {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match StringList::deserialize(deserializer)? {
        StringList::List(list) => list,
        StringList::Joined(joined) => joined
            .split(|c: char| c == ',' || c == '\n')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Unknown geometry names are dropped so one odd entry does not reject a
/// whole catalogue.
pub(crate) fn geometry_list<'de, D>(deserializer: D) -> std::result::Result<Vec<GeometryKind>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(names
        .iter()
        .filter_map(|name| match name.parse::<GeometryKind>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!(error = %e, "ignoring unknown geometry");
                None
            }
        })
        .collect())
}

fn default_searchable() -> bool {
    true
}

fn default_match_score() -> f64 {
    1.0
}

impl FeatureDefinition {
    /// Build a feature from its merged JSON record
    pub fn from_value(id: &str, value: &Value, is_supplementary: bool) -> Result<Self> {
        let raw = RawPreset::deserialize(value).map_err(|e| PresetError::InvalidDocument {
            name: id.to_string(),
            reason: e.to_string(),
        })?;

        let add_tags = raw.add_tags.unwrap_or_else(|| raw.tags.clone());
        let remove_tags = raw.remove_tags.unwrap_or_else(|| add_tags.clone());
        let location_set = raw
            .location_set
            .and_then(|set| set.include)
            .map(|include| LocationSet {
                include: include.iter().map(LocationRule::from_value).collect(),
            });

        Ok(Self {
            id: id.to_string(),
            name: raw.name,
            tags: raw.tags,
            add_tags,
            remove_tags,
            geometry: raw.geometry,
            fields: raw.fields,
            more_fields: raw.more_fields,
            icon: raw.icon,
            terms: raw.terms,
            aliases: raw.aliases,
            searchable: raw.searchable,
            match_score: raw.match_score,
            location_set,
            reference: raw.reference,
            replacement: raw.replacement,
            is_supplementary,
        })
    }

    /// Whether this preset lists `geometry`
    pub fn applies_to(&self, geometry: GeometryKind) -> bool {
        self.geometry.contains(&geometry)
    }

    /// ID of the logical parent, if any
    pub fn parent_id(&self) -> Option<&str> {
        hierarchy::parent_id(&self.id)
    }

    /// Display name, falling back to the ID
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
