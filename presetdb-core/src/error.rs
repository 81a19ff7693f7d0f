//! Error types for presets database operations
//!
//! The taxonomy follows how each failure is handled at runtime:
//! - **Fatal load errors** abort database construction (base catalogue,
//!   defaults, categories, fields, address formats)
//! - **Degraded load errors** are recovered where they happen (translation
//!   documents fall back to untranslated text)
//! - **Background load failures** leave the published snapshot facet as it
//!   was (supplementary catalogue, region dataset)
//! - **Unrecognized location rules** make a single feature non-admitting
//!
//! Not finding a matching preset is not an error; matching returns `None`.
//!
//! # Example
//!
//! ```rust
//! use presetdb_core::error::{PresetError, ErrorCategory};
//!
//! fn report(err: &PresetError) {
//!     match err.category() {
//!         ErrorCategory::NotFound => println!("missing asset or feature"),
//!         ErrorCategory::Validation => println!("malformed document"),
//!         _ => println!("other error"),
//!     }
//!
//!     if err.is_fatal() {
//!         println!("database cannot be constructed");
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for presets database operations
pub type Result<T> = std::result::Result<T, PresetError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Asset or feature not found
    NotFound,
    /// Document shape or content is invalid
    Validation,
    /// Bug or broken invariant
    Internal,
    /// I/O or background task failure
    External,
}

/// Errors that can occur while loading or querying the presets database
#[derive(Error, Debug)]
pub enum PresetError {
    // ═══════════════════════════════════════════════════════════════════════
    // Document loading
    // ═══════════════════════════════════════════════════════════════════════

    /// An asset could not be read from the asset source
    #[error("Asset not found: '{name}': {reason}")]
    MissingAsset { name: String, reason: String },

    /// An asset was read but is not a valid document of the expected shape
    #[error("Invalid document '{name}': {reason}")]
    InvalidDocument { name: String, reason: String },

    /// A structured value had a different kind than the accessor expected
    #[error("Type mismatch at {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A geometry name that is not one of point, vertex, line, area, relation
    #[error("Unknown geometry '{value}'. Expected one of point, vertex, line, area, relation.")]
    UnknownGeometry { value: String },

    /// Translation document missing or malformed; recovered with base text
    #[error("Translation for '{language}' unavailable: {reason}")]
    TranslationUnavailable { language: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Background augmentation
    // ═══════════════════════════════════════════════════════════════════════

    /// Supplementary catalogue or region dataset failed to load
    #[error("Background load '{task}' failed: {reason}")]
    BackgroundLoadFailed { task: &'static str, reason: String },

    /// A task was started again for the same database; the first start is
    /// the only one that publishes
    #[error("Background task '{task}' was already started")]
    AlreadyStarted { task: &'static str },

    /// Background task panicked or was aborted before publishing
    #[error("Background task '{task}' did not complete: {reason}")]
    TaskJoin { task: &'static str, reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Query time
    // ═══════════════════════════════════════════════════════════════════════

    /// A location rule of a shape this database cannot evaluate
    #[error("Unrecognized location rule in '{feature_id}': {rule}")]
    UnrecognizedLocationRule { feature_id: String, rule: String },

    /// Feature ID is not present in any published catalogue
    #[error("Feature not found: '{id}'")]
    FeatureNotFound { id: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Infrastructure errors
    // ═══════════════════════════════════════════════════════════════════════

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// I/O operation failed
    #[error("IO error: {message}")]
    IoError { message: String },
}

impl PresetError {
    /// Returns true if this error aborts database construction when it
    /// happens while loading base data
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PresetError::MissingAsset { .. }
                | PresetError::InvalidDocument { .. }
                | PresetError::TypeMismatch { .. }
                | PresetError::UnknownGeometry { .. }
                | PresetError::JsonError(_)
                | PresetError::IoError { .. }
        )
    }

    /// Returns true if the database keeps working, possibly degraded
    ///
    /// Recoverable errors are handled where they occur and only logged:
    /// - Translation fallback to base text
    /// - Background loads that leave the snapshot unchanged
    /// - Location rules that simply do not admit a feature
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PresetError::TranslationUnavailable { .. }
                | PresetError::BackgroundLoadFailed { .. }
                | PresetError::AlreadyStarted { .. }
                | PresetError::TaskJoin { .. }
                | PresetError::UnrecognizedLocationRule { .. }
        )
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            PresetError::MissingAsset { .. } | PresetError::FeatureNotFound { .. } => {
                ErrorCategory::NotFound
            }

            PresetError::InvalidDocument { .. }
            | PresetError::TypeMismatch { .. }
            | PresetError::UnknownGeometry { .. }
            | PresetError::UnrecognizedLocationRule { .. }
            | PresetError::JsonError(_) => ErrorCategory::Validation,

            PresetError::TaskJoin { .. } | PresetError::AlreadyStarted { .. } => ErrorCategory::Internal,

            PresetError::TranslationUnavailable { .. }
            | PresetError::BackgroundLoadFailed { .. }
            | PresetError::IoError { .. } => ErrorCategory::External,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            PresetError::MissingAsset { .. } => "MISSING_ASSET",
            PresetError::InvalidDocument { .. } => "INVALID_DOCUMENT",
            PresetError::TypeMismatch { .. } => "TYPE_MISMATCH",
            PresetError::UnknownGeometry { .. } => "UNKNOWN_GEOMETRY",
            PresetError::TranslationUnavailable { .. } => "TRANSLATION_UNAVAILABLE",
            PresetError::BackgroundLoadFailed { .. } => "BACKGROUND_LOAD_FAILED",
            PresetError::AlreadyStarted { .. } => "ALREADY_STARTED",
            PresetError::TaskJoin { .. } => "TASK_JOIN",
            PresetError::UnrecognizedLocationRule { .. } => "UNRECOGNIZED_LOCATION_RULE",
            PresetError::FeatureNotFound { .. } => "FEATURE_NOT_FOUND",
            PresetError::JsonError(_) => "JSON_ERROR",
            PresetError::IoError { .. } => "IO_ERROR",
        }
    }

    /// Converts this error to a JSON-serializable response object
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                recoverable: self.is_recoverable(),
            },
        }
    }
}

impl From<std::io::Error> for PresetError {
    fn from(err: std::io::Error) -> Self {
        PresetError::IoError {
            message: err.to_string(),
        }
    }
}

/// JSON-serializable error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "MISSING_ASSET")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
    /// Whether the database keeps working after this error
    pub recoverable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_and_recoverable_are_disjoint() {
        let fatal = PresetError::MissingAsset {
            name: "presets.json".to_string(),
            reason: "no such file".to_string(),
        };
        assert!(fatal.is_fatal());
        assert!(!fatal.is_recoverable());

        let degraded = PresetError::TranslationUnavailable {
            language: "fr".to_string(),
            reason: "missing".to_string(),
        };
        assert!(!degraded.is_fatal());
        assert!(degraded.is_recoverable());

        let background = PresetError::BackgroundLoadFailed {
            task: "supplementary",
            reason: "malformed".to_string(),
        };
        assert!(!background.is_fatal());
        assert!(background.is_recoverable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PresetError::FeatureNotFound {
                id: "amenity/cafe".to_string()
            }
            .error_code(),
            "FEATURE_NOT_FOUND"
        );
        assert_eq!(
            PresetError::UnknownGeometry {
                value: "blob".to_string()
            }
            .error_code(),
            "UNKNOWN_GEOMETRY"
        );

        let repeated = PresetError::AlreadyStarted { task: "regions" };
        assert_eq!(repeated.error_code(), "ALREADY_STARTED");
        assert!(repeated.is_recoverable());
        assert!(!repeated.is_fatal());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            PresetError::MissingAsset {
                name: "fields.json".to_string(),
                reason: "gone".to_string()
            }
            .category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            PresetError::TypeMismatch {
                context: "presets".to_string(),
                expected: "object",
                found: "array"
            }
            .category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            PresetError::TaskJoin {
                task: "regions",
                reason: "panicked".to_string()
            }
            .category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_error_response_serialization() {
        let err = PresetError::InvalidDocument {
            name: "presets.json".to_string(),
            reason: "expected object".to_string(),
        };
        let response = err.to_error_response();

        let json = serde_json::to_string_pretty(&response).unwrap();
        assert!(json.contains("INVALID_DOCUMENT"));
        assert!(json.contains("presets.json"));
        assert!(json.contains("validation"));

        let parsed: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.error.code, "INVALID_DOCUMENT");
        assert!(!parsed.error.recoverable);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err: PresetError = io.into();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(err.to_string().contains("nope"));
    }
}
