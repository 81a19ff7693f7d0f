//! Auxiliary lookup tables
//!
//! Defaults, categories, fields and address formats describe and display
//! presets. None of them takes part in matching.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PresetError, Result};
use crate::registry::feature::geometry_list;
use crate::registry::GeometryKind;
use crate::value::ValueExt;

/// Geometry name → ordered feature/category IDs offered by default
#[derive(Debug, Clone, Default)]
pub struct DefaultsTable {
    by_geometry: IndexMap<String, Vec<String>>,
}

impl DefaultsTable {
    pub fn from_value(value: &Value) -> Result<Self> {
        let by_geometry = IndexMap::<String, Vec<String>>::deserialize(value).map_err(|e| {
            PresetError::InvalidDocument {
                name: "defaults".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { by_geometry })
    }

    pub fn for_geometry(&self, geometry: GeometryKind) -> &[String] {
        self.by_geometry
            .get(geometry.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_geometry.is_empty()
    }
}

/// A named group of feature IDs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(skip_deserializing)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "geometry_list")]
    pub geometry: Vec<GeometryKind>,
    #[serde(default)]
    pub members: Vec<String>,
}

impl Category {
    pub fn from_value(id: &str, value: &Value) -> Result<Self> {
        let mut category = Category::deserialize(value).map_err(|e| PresetError::InvalidDocument {
            name: format!("categories.{id}"),
            reason: e.to_string(),
        })?;
        category.id = id.to_string();
        Ok(category)
    }
}

/// Description of one tag key (or key group) for editing and display
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub id: String,
    /// Single tag key
    pub key: Option<String>,
    /// Multiple tag keys (e.g. address parts)
    pub keys: Vec<String>,
    /// Field type, e.g. `check`, `combo`, `text`
    pub field_type: Option<String>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    /// Raw option values, kept untranslated
    pub options: Option<Value>,
    /// Translated labels keyed by option value
    pub strings: Option<Value>,
    /// The whole merged record
    pub raw: Value,
}

impl FieldDefinition {
    pub fn from_value(id: &str, value: &Value) -> Result<Self> {
        let record = value.as_object_checked(&format!("fields.{id}"))?;
        let text = |name: &str| -> Result<Option<String>> {
            record
                .get(name)
                .map(|v| v.as_str_checked(&format!("fields.{id}.{name}")).map(str::to_string))
                .transpose()
        };

        let keys = match record.get("keys") {
            Some(keys) => keys
                .as_array_checked(&format!("fields.{id}.keys"))?
                .iter()
                .map(|key| key.as_str_checked(&format!("fields.{id}.keys")).map(str::to_string))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            id: id.to_string(),
            key: text("key")?,
            keys,
            field_type: text("type")?,
            label: text("label")?,
            placeholder: text("placeholder")?,
            options: record.get("options").cloned(),
            strings: record.get("strings").cloned(),
            raw: value.clone(),
        })
    }

    /// Raw option values, whether the document lists them or maps them
    pub fn option_values(&self) -> Vec<&str> {
        match &self.options {
            Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
            Some(Value::Object(map)) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Display label of an option value
    ///
    /// Looks in translated `strings` first (either `{value: label}` or
    /// `{options: {value: label}}`, labels may be `{title}` records), then in
    /// a mapped `options` record.
    pub fn option_label(&self, value: &str) -> Option<&str> {
        fn label_of<'a>(entry: &'a Value) -> Option<&'a str> {
            match entry {
                Value::String(label) => Some(label),
                Value::Object(record) => record.get("title").and_then(Value::as_str),
                _ => None,
            }
        }

        let from_strings = self.strings.as_ref().and_then(|strings| {
            strings
                .get("options")
                .and_then(|options| options.get(value))
                .or_else(|| strings.get(value))
                .and_then(label_of)
        });

        from_strings.or_else(|| {
            self.options
                .as_ref()
                .and_then(Value::as_object)
                .and_then(|options| options.get(value))
                .and_then(label_of)
        })
    }
}

/// Address layout for a set of countries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFormat {
    /// Lowercase country codes; empty for the fallback format
    #[serde(default)]
    pub country_codes: Vec<String>,
    /// Rows of address field names
    #[serde(default)]
    pub format: Vec<Vec<String>>,
}

/// Ordered address formats with a fallback entry
#[derive(Debug, Clone, Default)]
pub struct AddressFormats {
    formats: Vec<AddressFormat>,
}

impl AddressFormats {
    pub fn from_value(value: &Value) -> Result<Self> {
        let formats = Vec::<AddressFormat>::deserialize(value).map_err(|e| {
            PresetError::InvalidDocument {
                name: "address formats".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { formats })
    }

    /// Format for a country code, else the first format without codes
    pub fn for_country(&self, country_code: &str) -> Option<&AddressFormat> {
        let code = country_code.to_lowercase();
        self.formats
            .iter()
            .find(|f| f.country_codes.iter().any(|c| c.eq_ignore_ascii_case(&code)))
            .or_else(|| self.formats.iter().find(|f| f.country_codes.is_empty()))
    }

    pub fn all(&self) -> &[AddressFormat] {
        &self.formats
    }
}

/// Localized yes / no / unknown labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleStrings {
    pub yes: String,
    pub no: String,
    pub unknown: String,
}

impl Default for LocaleStrings {
    fn default() -> Self {
        Self {
            yes: "Yes".to_string(),
            no: "No".to_string(),
            unknown: "???".to_string(),
        }
    }
}

impl LocaleStrings {
    /// Read the labels from a translation's `fields` record
    pub fn from_translated_fields(fields: Option<&Value>) -> Self {
        let defaults = Self::default();
        let Some(fields) = fields else {
            return defaults;
        };

        let yes_no = fields.get("internet_access").and_then(|f| f.get("options"));
        let pick = |name: &str| yes_no.and_then(|o| o.get(name)).and_then(Value::as_str);

        Self {
            yes: pick("yes").map(str::to_string).unwrap_or(defaults.yes),
            no: pick("no").map(str::to_string).unwrap_or(defaults.no),
            unknown: fields
                .get("opening_hours")
                .and_then(|f| f.get("placeholder"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.unknown),
        }
    }
}
