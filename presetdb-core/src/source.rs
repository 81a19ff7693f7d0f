//! Asset sources
//!
//! The database never touches the filesystem directly; it asks an
//! [`AssetSource`] for the bytes of a named document:
//! - [`DirectorySource`] reads files under a root directory
//! - [`MemorySource`] serves documents held in memory

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{PresetError, Result};
use crate::value::parse_document;

/// Provider of raw asset bytes by name
pub trait AssetSource: Send + Sync {
    /// Read the bytes of a named asset
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Read and parse a named JSON asset
    fn read_json(&self, name: &str) -> Result<Value> {
        let bytes = self.read(name)?;
        parse_document(name, &bytes)
    }
}

/// Assets stored as files below a root directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory of this source
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirectorySource {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        fs::read(&path).map_err(|e| PresetError::MissingAsset {
            name: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Assets held in memory, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add raw bytes under `name`
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), bytes.into());
    }

    /// Add a JSON document under `name`
    pub fn with_json(mut self, name: impl Into<String>, document: &Value) -> Self {
        self.insert(name, document.to_string());
        self
    }

    /// Add raw bytes under `name`
    pub fn with_bytes(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    /// Number of stored assets
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no assets are stored
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AssetSource for MemorySource {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| PresetError::MissingAsset {
                name: name.to_string(),
                reason: "not present in memory source".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_source_round_trip() {
        let source = MemorySource::new().with_json("fields.json", &json!({"name": {"key": "name"}}));
        let doc = source.read_json("fields.json").unwrap();
        assert_eq!(doc["name"]["key"], "name");
    }

    #[test]
    fn test_memory_source_missing() {
        let source = MemorySource::new();
        let err = source.read("presets.json").unwrap_err();
        assert_eq!(err.error_code(), "MISSING_ASSET");
    }

    #[test]
    fn test_memory_source_malformed_json() {
        let source = MemorySource::new().with_bytes("presets.json", "{ broken");
        let err = source.read_json("presets.json").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DOCUMENT");
    }

    #[test]
    fn test_directory_source_reads_nested_files() {
        let dir = std::env::temp_dir().join(format!("presetdb-source-{}", std::process::id()));
        fs::create_dir_all(dir.join("translations")).unwrap();
        fs::write(dir.join("translations/en.json"), r#"{"en": {}}"#).unwrap();

        let source = DirectorySource::new(&dir);
        let doc = source.read_json("translations/en.json").unwrap();
        assert!(doc.get("en").is_some());
        assert!(source.read("missing.json").is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
