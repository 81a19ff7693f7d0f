//! Database configuration
//!
//! Names every asset the database reads and the language used to pick the
//! translation document. All file names are relative to the asset source.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PresetError, Result};

/// Configuration for building a [`crate::PresetsDatabase`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Preferred language code (default: "en")
    pub language: String,
    /// Base preset catalogue (default: "presets.json")
    pub presets_file: String,
    /// Supplementary catalogue, nested under "presets" (default: "nsi_presets.json")
    pub supplementary_file: String,
    /// geoJSON regions referenced by location rules (default: "nsi_geojson.json")
    pub regions_file: String,
    /// Directory holding `<language>.json` translations (default: "translations")
    pub translations_dir: String,
    /// Defaults per geometry (default: "preset_defaults.json")
    pub defaults_file: String,
    /// Category definitions (default: "preset_categories.json")
    pub categories_file: String,
    /// Field definitions (default: "fields.json")
    pub fields_file: String,
    /// Address formats (default: "address_formats.json")
    pub address_formats_file: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            presets_file: "presets.json".to_string(),
            supplementary_file: "nsi_presets.json".to_string(),
            regions_file: "nsi_geojson.json".to_string(),
            translations_dir: "translations".to_string(),
            defaults_file: "preset_defaults.json".to_string(),
            categories_file: "preset_categories.json".to_string(),
            fields_file: "fields.json".to_string(),
            address_formats_file: "address_formats.json".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Set the preferred language code
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the base catalogue file
    pub fn with_presets_file(mut self, name: impl Into<String>) -> Self {
        self.presets_file = name.into();
        self
    }

    /// Set the supplementary catalogue file
    pub fn with_supplementary_file(mut self, name: impl Into<String>) -> Self {
        self.supplementary_file = name.into();
        self
    }

    /// Set the region dataset file
    pub fn with_regions_file(mut self, name: impl Into<String>) -> Self {
        self.regions_file = name.into();
        self
    }

    /// Set the translations directory
    pub fn with_translations_dir(mut self, dir: impl Into<String>) -> Self {
        self.translations_dir = dir.into();
        self
    }

    /// Asset name of the translation document for the configured language
    pub fn translation_file(&self) -> String {
        format!("{}/{}.json", self.translations_dir, self.language)
    }

    /// Load a configuration from a JSON file; missing keys take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PresetError::MissingAsset {
            name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| PresetError::InvalidDocument {
            name: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.language, "en");
        assert_eq!(config.translation_file(), "translations/en.json");
        assert_eq!(config.supplementary_file, "nsi_presets.json");
    }

    #[test]
    fn test_builder() {
        let config = DatabaseConfig::default()
            .with_language("fr")
            .with_translations_dir("i18n")
            .with_presets_file("base.json");
        assert_eq!(config.translation_file(), "i18n/fr.json");
        assert_eq!(config.presets_file, "base.json");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DatabaseConfig =
            serde_json::from_str(r#"{"language": "de", "regions_file": "regions.json"}"#).unwrap();
        assert_eq!(config.language, "de");
        assert_eq!(config.regions_file, "regions.json");
        assert_eq!(config.fields_file, "fields.json");
    }
}
