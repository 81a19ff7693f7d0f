//! # presetdb - tag-driven preset matching and search
//!
//! A presets database answers two questions about map features:
//!
//! - **Matching**: given an entity's key/value tags and geometry kind, which
//!   catalogued preset describes it best?
//! - **Search**: which presets match a free-text query, apply to a geometry
//!   and are valid at a location?
//!
//! The base catalogue is built synchronously from JSON documents merged with
//! a translation. A much larger supplementary (brand/name) catalogue and a
//! geoJSON region dataset are loaded afterwards and published atomically, so
//! queries never wait on them.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use presetdb_core::{DatabaseConfig, GeometryKind, MemorySource, PresetsDatabase, Tags};
//! use serde_json::json;
//!
//! let source = MemorySource::new()
//!     .with_json("presets.json", &json!({
//!         "amenity/cafe": {"name": "Cafe", "tags": {"amenity": "cafe"}, "geometry": ["point", "area"]}
//!     }))
//!     .with_json("preset_defaults.json", &json!({}))
//!     .with_json("preset_categories.json", &json!({}))
//!     .with_json("fields.json", &json!({}))
//!     .with_json("address_formats.json", &json!([]));
//!
//! let db = PresetsDatabase::open(Arc::new(source), DatabaseConfig::default()).unwrap();
//!
//! let mut tags = Tags::new();
//! tags.insert("amenity".to_string(), "cafe".to_string());
//! let cafe = db.match_tags(&tags, GeometryKind::Point, true).unwrap();
//! assert_eq!(cafe.id, "amenity/cafe");
//! ```

pub mod augment;
pub mod config;
pub mod database;
pub mod error;
pub mod hierarchy;
pub mod index;
pub mod matcher;
pub mod region;
pub mod registry;
pub mod search;
pub mod snapshot;
pub mod source;
pub mod value;

// Re-export main types
pub use augment::AugmentOutcome;
#[cfg(feature = "async-runtime")]
pub use augment::AugmentHandle;
pub use config::DatabaseConfig;
pub use database::{PresetsDatabase, PresetsHandle};
pub use error::{ErrorCategory, ErrorDetail, ErrorResponse, PresetError, Result};
pub use index::TagIndex;
pub use matcher::{MatchResult, MatchScore};
pub use region::{BoundaryProvider, BoundaryTable, GeoRegion, NoBoundaries, RegionSet};
pub use registry::{
    Catalogue, Category, FeatureDefinition, FieldDefinition, GeometryKind, LocaleStrings,
    LocationRule, LocationSet, Registry, Tags,
};
pub use search::{DefaultTextScorer, LatLon, SearchHit, TextScorer};
pub use snapshot::CatalogueSnapshot;
pub use source::{AssetSource, DirectorySource, MemorySource};
pub use value::ValueExt;
