//! Feature Registry
//!
//! Builds the canonical in-memory catalogue from the base documents and the
//! translation for the configured language.
//!
//! ## Architecture
//!
//! ```text
//! presets.json   translations/<lang>.json   defaults / categories / fields
//!       │                   │                          │
//!       ▼                   ▼                          ▼
//!    ┌──────────────────────────────────────────────────────┐
//!    │                      Registry                        │
//!    │                                                      │
//!    │  1. Read base documents (fatal on failure)           │
//!    │  2. Read translation (degrades to base text)         │
//!    │  3. Deep merge each document with its translation    │
//!    │  4. Build FeatureDefinitions in document order       │
//!    │  5. Build auxiliary tables                           │
//!    └──────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//!              Catalogue + auxiliary tables
//! ```

mod feature;
mod merge;
mod tables;

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

pub use feature::{
    FeatureDefinition, GeometryKind, LocationRule, LocationSet, Tags, DEFAULT_CIRCLE_RADIUS,
    WORLDWIDE_CODE,
};
pub use merge::translate;
pub use tables::{
    AddressFormat, AddressFormats, Category, DefaultsTable, FieldDefinition, LocaleStrings,
};

use crate::config::DatabaseConfig;
use crate::error::{PresetError, Result};
use crate::source::AssetSource;
use crate::value::ValueExt;

/// Feature ID → feature, in document order
pub type Catalogue = IndexMap<String, Arc<FeatureDefinition>>;

/// Key under which the supplementary document nests its presets
pub const SUPPLEMENTARY_ROOT_KEY: &str = "presets";

/// Merge `base` with `translation` and build one feature per top-level key
///
/// `base` must be a record of records; any malformed base entry fails the
/// whole catalogue. A translated entry that no longer builds falls back to
/// its base entry.
pub fn load_catalogue(base: &Value, translation: Option<&Value>, is_supplementary: bool) -> Result<Catalogue> {
    let features = translate_records("presets", base, translation, |id, record| {
        FeatureDefinition::from_value(id, record, is_supplementary)
    })?;
    Ok(features
        .into_iter()
        .map(|(id, feature)| (id, Arc::new(feature)))
        .collect())
}

/// Merge a `{id: record}` document with its translation and build each record
///
/// Failures of the base document are returned. A record whose translated
/// form fails to build is rebuilt from its base record, and a malformed
/// record present only in the translation is dropped. Both are logged.
pub fn translate_records<T, F>(
    section: &str,
    base: &Value,
    translation: Option<&Value>,
    build: F,
) -> Result<IndexMap<String, T>>
where
    F: Fn(&str, &Value) -> Result<T>,
{
    let base_records = base.as_object_checked(section)?;
    let merged = translate(base, translation);
    let merged_records = merged.as_object_checked(section)?;

    let mut built = IndexMap::with_capacity(merged_records.len());
    for (id, record) in merged_records {
        let item = match build(id, record) {
            Ok(item) => item,
            Err(e) if translation.is_none() => return Err(e),
            Err(e) => match base_records.get(id) {
                Some(base_record) => {
                    warn!(section, id = %id, error = %e, "translated record rejected, using base text");
                    build(id, base_record)?
                }
                None => {
                    warn!(section, id = %id, error = %e, "dropping malformed translation-only record");
                    continue;
                }
            },
        };
        built.insert(id.clone(), item);
    }
    Ok(built)
}

/// Like [`translate_records`] for a document built as a whole
fn translate_document<T, F>(section: &str, base: &Value, translation: Option<&Value>, build: F) -> Result<T>
where
    F: Fn(&Value) -> Result<T>,
{
    if translation.is_none() {
        return build(base);
    }
    match build(&translate(base, translation)) {
        Ok(built) => Ok(built),
        Err(e) => {
            warn!(section, error = %e, "translated document rejected, using base text");
            build(base)
        }
    }
}

/// Build the supplementary catalogue from its `{"presets": {...}}` document
pub fn load_supplementary_catalogue(document: &Value) -> Result<Catalogue> {
    let root = document.as_object_checked("supplementary")?;
    let presets = root
        .get(SUPPLEMENTARY_ROOT_KEY)
        .ok_or_else(|| PresetError::InvalidDocument {
            name: "supplementary".to_string(),
            reason: format!("missing '{SUPPLEMENTARY_ROOT_KEY}' record"),
        })?;
    load_catalogue(presets, None, true)
}

/// Translated sections of a translation document
///
/// Layout: `{ <lang>: { "presets": { "defaults", "categories", "fields", "presets" } } }`.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    pub defaults: Option<Value>,
    pub categories: Option<Value>,
    pub fields: Option<Value>,
    pub presets: Option<Value>,
}

impl Translation {
    /// Extract the sections for `language`
    pub fn from_document(document: &Value, language: &str) -> Result<Self> {
        let sections = document
            .get(language)
            .and_then(|lang| lang.get("presets"))
            .ok_or_else(|| PresetError::TranslationUnavailable {
                language: language.to_string(),
                reason: format!("no '{language}.presets' record"),
            })?
            .as_object_checked("translation presets")?;

        let section = |name: &str| sections.get(name).cloned();
        Ok(Self {
            defaults: section("defaults"),
            categories: section("categories"),
            fields: section("fields"),
            presets: section("presets"),
        })
    }

    /// Read the translation for the configured language; any failure yields
    /// an empty translation so base text is used
    pub fn load_or_default(source: &dyn AssetSource, config: &DatabaseConfig) -> Self {
        let name = config.translation_file();
        let loaded = source
            .read_json(&name)
            .and_then(|document| Self::from_document(&document, &config.language));

        match loaded {
            Ok(translation) => {
                debug!(language = %config.language, "loaded translation");
                translation
            }
            Err(e) => {
                warn!(language = %config.language, error = %e, "translation unavailable, using base text");
                Self::default()
            }
        }
    }
}

/// Raw documents the registry is built from
#[derive(Debug, Clone)]
pub struct RegistryDocuments {
    pub presets: Value,
    pub defaults: Value,
    pub categories: Value,
    pub fields: Value,
    pub address_formats: Value,
    pub translation: Translation,
}

impl RegistryDocuments {
    /// Read every document named by `config`
    pub fn read(source: &dyn AssetSource, config: &DatabaseConfig) -> Result<Self> {
        Ok(Self {
            presets: source.read_json(&config.presets_file)?,
            defaults: source.read_json(&config.defaults_file)?,
            categories: source.read_json(&config.categories_file)?,
            fields: source.read_json(&config.fields_file)?,
            address_formats: source.read_json(&config.address_formats_file)?,
            translation: Translation::load_or_default(source, config),
        })
    }
}

/// The base catalogue plus its read-only auxiliary tables
#[derive(Debug, Clone)]
pub struct Registry {
    base: Arc<Catalogue>,
    defaults: DefaultsTable,
    categories: IndexMap<String, Category>,
    fields: IndexMap<String, FieldDefinition>,
    address_formats: AddressFormats,
    locale: LocaleStrings,
}

impl Registry {
    /// Read and build everything from an asset source
    pub fn load(source: &dyn AssetSource, config: &DatabaseConfig) -> Result<Self> {
        let documents = RegistryDocuments::read(source, config)?;
        Self::from_documents(&documents)
    }

    /// Build from already-read documents
    pub fn from_documents(documents: &RegistryDocuments) -> Result<Self> {
        let translation = &documents.translation;

        let defaults = translate_document(
            "defaults",
            &documents.defaults,
            translation.defaults.as_ref(),
            DefaultsTable::from_value,
        )?;
        let categories = translate_records(
            "categories",
            &documents.categories,
            translation.categories.as_ref(),
            Category::from_value,
        )?;
        let fields = translate_records(
            "fields",
            &documents.fields,
            translation.fields.as_ref(),
            FieldDefinition::from_value,
        )?;
        let address_formats = AddressFormats::from_value(&documents.address_formats)?;
        let locale = LocaleStrings::from_translated_fields(translation.fields.as_ref());

        let base = load_catalogue(&documents.presets, translation.presets.as_ref(), false)?;
        info!(
            features = base.len(),
            categories = categories.len(),
            fields = fields.len(),
            "built base catalogue"
        );

        Ok(Self {
            base: Arc::new(base),
            defaults,
            categories,
            fields,
            address_formats,
            locale,
        })
    }

    /// The base catalogue
    pub fn base(&self) -> &Arc<Catalogue> {
        &self.base
    }

    /// Feature/category IDs offered by default for a geometry
    pub fn defaults_for(&self, geometry: GeometryKind) -> &[String] {
        self.defaults.for_geometry(geometry)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.get(id)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.get(id)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    pub fn address_formats(&self) -> &AddressFormats {
        &self.address_formats
    }

    pub fn locale_strings(&self) -> &LocaleStrings {
        &self.locale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_json(
                "presets.json",
                &json!({
                    "amenity/cafe": {"tags": {"amenity": "cafe"}, "geometry": ["point", "area"], "fields": ["name"]},
                    "amenity/bench": {"tags": {"amenity": "bench"}, "geometry": ["point", "vertex"]}
                }),
            )
            .with_json("preset_defaults.json", &json!({"point": ["amenity/cafe"]}))
            .with_json("preset_categories.json", &json!({"category-food": {"members": ["amenity/cafe"]}}))
            .with_json(
                "fields.json",
                &json!({"internet_access": {"key": "internet_access", "type": "combo", "options": ["yes", "no"]}}),
            )
            .with_json("address_formats.json", &json!([{"format": [["street"]]}]))
    }

    fn french() -> Value {
        json!({
            "fr": {
                "presets": {
                    "categories": {"category-food": {"name": "Nourriture"}},
                    "fields": {"internet_access": {"label": "Accès Internet", "options": {"yes": "Oui", "no": "Non"}}},
                    "presets": {"amenity/cafe": {"name": "Café", "terms": "café,expresso"}}
                }
            }
        })
    }

    #[test]
    fn test_load_catalogue_keeps_document_order() {
        let catalogue = load_catalogue(
            &json!({"b": {"tags": {"b": "*"}}, "a": {"tags": {"a": "*"}}, "c": {}}),
            None,
            false,
        )
        .unwrap();
        let ids: Vec<&str> = catalogue.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_load_catalogue_rejects_non_record() {
        assert!(load_catalogue(&json!(["amenity/cafe"]), None, false).is_err());
        assert!(load_catalogue(&json!({"amenity/cafe": "cafe"}), None, false).is_err());
    }

    #[test]
    fn test_supplementary_is_nested_and_flagged() {
        let catalogue = load_supplementary_catalogue(&json!({
            "presets": {"amenity/cafe/starbucks": {"tags": {"amenity": "cafe", "brand": "Starbucks"}, "geometry": ["point"]}}
        }))
        .unwrap();
        assert!(catalogue["amenity/cafe/starbucks"].is_supplementary);

        assert!(load_supplementary_catalogue(&json!({"amenity/cafe": {}})).is_err());
    }

    #[test]
    fn test_supplementary_survives_unknown_geometry() {
        let catalogue = load_supplementary_catalogue(&json!({
            "presets": {
                "shop/bakery/paul": {"tags": {"shop": "bakery"}, "geometry": ["point", "building"]},
                "shop/books/folio": {"tags": {"shop": "books"}, "geometry": ["point"]}
            }
        }))
        .unwrap();
        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue["shop/bakery/paul"].geometry, vec![GeometryKind::Point]);
    }

    #[test]
    fn test_registry_without_translation() {
        let registry = Registry::load(&source(), &DatabaseConfig::default()).unwrap();
        assert_eq!(registry.base().len(), 2);
        assert_eq!(registry.defaults_for(GeometryKind::Point), ["amenity/cafe"]);
        assert_eq!(registry.locale_strings(), &LocaleStrings::default());
        assert!(registry.base()["amenity/cafe"].name.is_none());
        assert!(registry.address_formats().for_country("fr").is_some());
    }

    #[test]
    fn test_registry_with_translation() {
        let translated = source().with_json("translations/fr.json", &french());
        let config = DatabaseConfig::default().with_language("fr");
        let registry = Registry::load(&translated, &config).unwrap();

        let cafe = &registry.base()["amenity/cafe"];
        assert_eq!(cafe.name.as_deref(), Some("Café"));
        assert_eq!(cafe.terms, vec!["café", "expresso"]);

        let field = registry.field("internet_access").unwrap();
        assert_eq!(field.label.as_deref(), Some("Accès Internet"));
        assert_eq!(field.option_values(), vec!["yes", "no"]);
        assert_eq!(field.option_label("yes"), Some("Oui"));

        assert_eq!(registry.category("category-food").unwrap().name.as_deref(), Some("Nourriture"));
        assert_eq!(registry.locale_strings().yes, "Oui");
    }

    #[test]
    fn test_malformed_translation_degrades() {
        let broken = source().with_bytes("translations/en.json", "{ not json");
        let registry = Registry::load(&broken, &DatabaseConfig::default()).unwrap();
        assert_eq!(registry.base().len(), 2);

        let wrong_language = source().with_json("translations/en.json", &json!({"de": {}}));
        let registry = Registry::load(&wrong_language, &DatabaseConfig::default()).unwrap();
        assert!(registry.base()["amenity/cafe"].name.is_none());
    }

    #[test]
    fn test_rejected_translated_records_fall_back_to_base() {
        let translation = json!({
            "en": {
                "presets": {
                    "defaults": {"point": "amenity/cafe"},
                    "categories": {"category-food": {"name": "Food", "members": "amenity/cafe"}},
                    "fields": {"internet_access": {"label": 42}},
                    "presets": {
                        "amenity/cafe": {"name": 42},
                        "amenity/bench": {"name": "Bench"},
                        "amenity/ghost": {"geometry": "point"}
                    }
                }
            }
        });
        let translated = source().with_json("translations/en.json", &translation);
        let registry = Registry::load(&translated, &DatabaseConfig::default()).unwrap();

        let cafe = &registry.base()["amenity/cafe"];
        assert!(cafe.name.is_none());
        assert_eq!(cafe.fields.as_deref(), Some(&["name".to_string()][..]));
        // Other entries keep their translation
        assert_eq!(registry.base()["amenity/bench"].name.as_deref(), Some("Bench"));
        assert!(!registry.base().contains_key("amenity/ghost"));

        assert_eq!(registry.defaults_for(GeometryKind::Point), ["amenity/cafe"]);
        assert_eq!(registry.category("category-food").unwrap().members, vec!["amenity/cafe"]);
        let field = registry.field("internet_access").unwrap();
        assert!(field.label.is_none());
        assert_eq!(field.option_values(), vec!["yes", "no"]);
    }

    #[test]
    fn test_translation_cannot_mask_malformed_base_record() {
        let broken = source()
            .with_json("presets.json", &json!({"amenity/cafe": {"name": 42}}))
            .with_json("translations/en.json", &json!({"en": {"presets": {"presets": {"amenity/cafe": {"name": "Cafe"}}}}}));
        let err = Registry::load(&broken, &DatabaseConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DOCUMENT");
    }

    #[test]
    fn test_missing_base_document_is_fatal() {
        let source = MemorySource::new().with_json("presets.json", &json!({}));
        let err = Registry::load(&source, &DatabaseConfig::default()).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.error_code(), "MISSING_ASSET");
    }

    #[test]
    fn test_malformed_base_document_is_fatal() {
        let broken = source().with_bytes("presets.json", "[1, 2");
        let err = Registry::load(&broken, &DatabaseConfig::default()).unwrap_err();
        assert!(err.is_fatal());
    }
}
