//! Presets Database - the query facade
//!
//! ```text
//!                       PresetsDatabase
//!   ┌──────────────────────────────────────────────────────────┐
//!   │  Registry (base catalogue + auxiliary tables, immutable) │
//!   │                                                          │
//!   │  SnapshotCell ──► CatalogueSnapshot                      │
//!   │                     base / supplementary catalogues      │
//!   │                     base / combined tag index            │
//!   │                     regions                              │
//!   │                                                          │
//!   │  BoundaryProvider, TextScorer (pluggable)                │
//!   └──────────────────────────────────────────────────────────┘
//!        ▲ match_tags / search / inherited_value
//!        │
//!   PresetsHandle ── reload(config) swaps in a fresh database
//! ```
//!
//! Queries read whichever snapshot is published when they start, so a query
//! racing with background augmentation sees either the old or the new facet,
//! never a mix within one facet.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::augment::{self, AugmentOutcome};
use crate::config::DatabaseConfig;
use crate::error::{PresetError, Result};
use crate::hierarchy::resolve_inherited;
use crate::matcher::{best_match, MatchResult};
use crate::region::{BoundaryProvider, NoBoundaries};
use crate::registry::{
    AddressFormat, Category, FeatureDefinition, FieldDefinition, GeometryKind, LocaleStrings, Registry, Tags,
};
use crate::search::{self, DefaultTextScorer, LatLon, LocationFilter, SearchHit, SearchQuery, TextScorer};
use crate::snapshot::{CatalogueSnapshot, SnapshotCell};
use crate::source::{AssetSource, DirectorySource};

#[cfg(feature = "async-runtime")]
use crate::augment::AugmentHandle;

pub struct PresetsDatabase {
    config: DatabaseConfig,
    source: Arc<dyn AssetSource>,
    registry: Registry,
    snapshot: Arc<SnapshotCell>,
    boundaries: Arc<dyn BoundaryProvider>,
    scorer: Arc<dyn TextScorer>,
}

impl fmt::Debug for PresetsDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresetsDatabase")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl PresetsDatabase {
    /// Build the registry and the initial snapshot synchronously
    ///
    /// Fails if any base document is missing or malformed. The
    /// supplementary catalogue and regions are not loaded here; see
    /// [`augment_now`](Self::augment_now) and `spawn_augmentation`.
    pub fn open(source: Arc<dyn AssetSource>, config: DatabaseConfig) -> Result<Self> {
        let registry = Registry::load(source.as_ref(), &config)?;
        let snapshot = CatalogueSnapshot::from_base(Arc::clone(registry.base()));
        info!(language = %config.language, features = registry.base().len(), "opened presets database");

        Ok(Self {
            config,
            source,
            registry,
            snapshot: Arc::new(SnapshotCell::new(snapshot)),
            boundaries: Arc::new(NoBoundaries),
            scorer: Arc::new(DefaultTextScorer),
        })
    }

    /// Open from documents stored under a directory
    pub fn open_dir<P: AsRef<Path>>(dir: P, config: DatabaseConfig) -> Result<Self> {
        Self::open(Arc::new(DirectorySource::new(dir)), config)
    }

    /// Open a fresh database from the same source and collaborators
    pub fn reopen(&self, config: DatabaseConfig) -> Result<Self> {
        Ok(Self::open(Arc::clone(&self.source), config)?
            .with_boundaries(Arc::clone(&self.boundaries))
            .with_text_scorer(Arc::clone(&self.scorer)))
    }

    pub fn with_boundaries(mut self, boundaries: Arc<dyn BoundaryProvider>) -> Self {
        self.boundaries = boundaries;
        self
    }

    pub fn with_text_scorer(mut self, scorer: Arc<dyn TextScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<CatalogueSnapshot> {
        self.snapshot.load()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Augmentation
    // ═══════════════════════════════════════════════════════════════════════

    /// Load the supplementary catalogue and regions on this thread
    pub fn augment_now(&self) -> AugmentOutcome {
        augment::augment_now(self.source.as_ref(), &self.config, &self.snapshot)
    }

    /// Load the supplementary catalogue and regions in the background
    #[cfg(feature = "async-runtime")]
    pub fn spawn_augmentation(&self) -> Result<AugmentHandle> {
        augment::spawn(Arc::clone(&self.source), &self.config, Arc::clone(&self.snapshot))
    }

    /// Start augmentation without waiting for it when a tokio runtime is
    /// running, otherwise run it on this thread
    fn start_augmentation(&self) {
        #[cfg(feature = "async-runtime")]
        {
            if tokio::runtime::Handle::try_current().is_ok() {
                match self.spawn_augmentation() {
                    Ok(_detached) => return,
                    Err(e) => tracing::warn!(error = %e, "could not spawn augmentation, loading on this thread"),
                }
            }
        }
        self.augment_now();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Matching
    // ═══════════════════════════════════════════════════════════════════════

    /// Best match with its score breakdown
    pub fn match_with_score(
        &self,
        tags: &Tags,
        geometry: GeometryKind,
        include_supplementary: bool,
    ) -> Option<MatchResult> {
        let snapshot = self.snapshot();
        best_match(snapshot.index(include_supplementary), tags, geometry)
    }

    /// Feature that best describes `tags` on `geometry`
    pub fn match_tags(
        &self,
        tags: &Tags,
        geometry: GeometryKind,
        include_supplementary: bool,
    ) -> Option<Arc<FeatureDefinition>> {
        self.match_with_score(tags, geometry, include_supplementary)
            .map(|found| found.feature)
    }

    /// Like [`match_tags`](Self::match_tags), falling back to the generic
    /// feature of the geometry (`point`, `line`, ...) when nothing matches
    pub fn match_or_fallback(
        &self,
        tags: &Tags,
        geometry: GeometryKind,
        include_supplementary: bool,
    ) -> Option<Arc<FeatureDefinition>> {
        self.match_tags(tags, geometry, include_supplementary)
            .or_else(|| self.registry.base().get(geometry.as_str()).cloned())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Search
    // ═══════════════════════════════════════════════════════════════════════

    /// Searchable base and supplementary features matching `text` that
    /// apply to `geometry` and are valid at `location`
    pub fn search(&self, text: Option<&str>, geometry: GeometryKind, location: LatLon) -> Vec<SearchHit> {
        let snapshot = self.snapshot();
        let filter = LocationFilter::new(self.boundaries.as_ref(), snapshot.regions());
        let query = SearchQuery {
            text,
            geometry,
            location,
        };
        search::search(snapshot.all_features(), &query, self.scorer.as_ref(), &filter)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lookup
    // ═══════════════════════════════════════════════════════════════════════

    /// Closest value `getter` finds walking from `id` up its ancestors in
    /// the base catalogue
    pub fn inherited_value<T, F>(&self, id: Option<&str>, getter: F) -> Option<T>
    where
        F: Fn(&FeatureDefinition) -> Option<T>,
    {
        resolve_inherited(self.registry.base(), id, getter)
    }

    /// Effective field IDs of a feature
    pub fn inherited_fields(&self, id: &str) -> Option<Vec<String>> {
        self.inherited_value(Some(id), |feature| feature.fields.clone())
    }

    /// Effective icon of a feature
    pub fn inherited_icon(&self, id: &str) -> Option<String> {
        self.inherited_value(Some(id), |feature| feature.icon.clone())
    }

    /// Feature by ID, base catalogue first
    pub fn feature(&self, id: &str) -> Option<Arc<FeatureDefinition>> {
        self.snapshot().feature(id).cloned()
    }

    /// Feature by ID, or `FeatureNotFound`
    pub fn require_feature(&self, id: &str) -> Result<Arc<FeatureDefinition>> {
        self.feature(id)
            .ok_or_else(|| PresetError::FeatureNotFound { id: id.to_string() })
    }

    /// Base features in document order
    pub fn base_features(&self) -> Vec<Arc<FeatureDefinition>> {
        self.registry.base().values().cloned().collect()
    }

    /// Base then supplementary features, as currently published
    pub fn all_features(&self) -> Vec<Arc<FeatureDefinition>> {
        self.snapshot().all_features().cloned().collect()
    }

    pub fn defaults_for(&self, geometry: GeometryKind) -> &[String] {
        self.registry.defaults_for(geometry)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.registry.category(id)
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.registry.field(id)
    }

    pub fn address_format(&self, country_code: &str) -> Option<&AddressFormat> {
        self.registry.address_formats().for_country(country_code)
    }

    pub fn locale_strings(&self) -> &LocaleStrings {
        self.registry.locale_strings()
    }
}

/// Shared handle to the current database
///
/// `reload` builds a complete replacement off to the side and swaps it in;
/// callers holding the previous database keep using it until they drop it.
#[derive(Debug)]
pub struct PresetsHandle {
    current: ArcSwap<PresetsDatabase>,
}

impl PresetsHandle {
    pub fn new(database: PresetsDatabase) -> Self {
        Self {
            current: ArcSwap::from_pointee(database),
        }
    }

    pub fn current(&self) -> Arc<PresetsDatabase> {
        self.current.load_full()
    }

    /// Replace the database with one built for `config`, e.g. after a
    /// language change. On failure the current database stays in place.
    ///
    /// The replacement starts its own augmentation: spawned on the current
    /// tokio runtime if there is one, else completed before the swap.
    pub fn reload(&self, config: DatabaseConfig) -> Result<Arc<PresetsDatabase>> {
        let database = Arc::new(self.current().reopen(config)?);
        database.start_augmentation();
        self.current.store(Arc::clone(&database));
        info!(language = %database.config().language, "reloaded presets database");
        Ok(database)
    }
}
