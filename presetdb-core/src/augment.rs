//! Async Augmentation Loader
//!
//! Two independent tasks enrich the published snapshot after the database
//! is constructed:
//!
//! ```text
//!   nsi_presets.json ──► supplementary catalogue ──► combined index ──┐
//!                                                                     ├──► SnapshotCell
//!   nsi_geojson.json ──► region set ──────────────────────────────────┘
//! ```
//!
//! Each task runs at most once per database: later starts, from either
//! entry point, return [`PresetError::AlreadyStarted`] without reading or
//! publishing anything. A failed task logs and leaves its facet as it was;
//! nothing is retried.
//!
//! With the `async-runtime` feature the tasks run on tokio's blocking pool
//! through [`spawn`]; [`augment_now`] runs both on the calling thread.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{PresetError, Result};
use crate::index::TagIndex;
use crate::region::RegionSet;
use crate::registry::{load_supplementary_catalogue, Catalogue};
use crate::snapshot::SnapshotCell;
use crate::source::AssetSource;

pub const SUPPLEMENTARY_TASK: &str = "supplementary";
pub const REGIONS_TASK: &str = "regions";

/// Read the supplementary catalogue and build the combined index over
/// `[base, supplementary]`
pub fn load_supplementary(
    source: &dyn AssetSource,
    config: &DatabaseConfig,
    base: &Catalogue,
) -> Result<(Arc<Catalogue>, Arc<TagIndex>)> {
    let document = source.read_json(&config.supplementary_file)?;
    let supplementary = load_supplementary_catalogue(&document)?;
    let combined = TagIndex::build(&[base, &supplementary], base);
    Ok((Arc::new(supplementary), Arc::new(combined)))
}

/// Read the region dataset
pub fn load_regions(source: &dyn AssetSource, config: &DatabaseConfig) -> Result<Arc<RegionSet>> {
    let document = source.read_json(&config.regions_file)?;
    Ok(Arc::new(RegionSet::from_feature_collection(&document)?))
}

fn background_failure(task: &'static str, err: PresetError) -> PresetError {
    let err = PresetError::BackgroundLoadFailed {
        task,
        reason: err.to_string(),
    };
    warn!(task, error = %err, "background load failed, snapshot unchanged");
    err
}

fn already_started(task: &'static str) -> PresetError {
    debug!(task, "augmentation task already started, skipping");
    PresetError::AlreadyStarted { task }
}

/// Load and publish the supplementary catalogue
pub fn run_supplementary(source: &dyn AssetSource, config: &DatabaseConfig, cell: &SnapshotCell) -> Result<()> {
    if !cell.claim_supplementary() {
        return Err(already_started(SUPPLEMENTARY_TASK));
    }
    let base = Arc::clone(cell.load().base());
    let (supplementary, combined) =
        load_supplementary(source, config, &base).map_err(|e| background_failure(SUPPLEMENTARY_TASK, e))?;
    cell.publish_supplementary(supplementary, combined);
    Ok(())
}

/// Load and publish the region dataset
pub fn run_regions(source: &dyn AssetSource, config: &DatabaseConfig, cell: &SnapshotCell) -> Result<()> {
    if !cell.claim_regions() {
        return Err(already_started(REGIONS_TASK));
    }
    let regions = load_regions(source, config).map_err(|e| background_failure(REGIONS_TASK, e))?;
    cell.publish_regions(regions);
    Ok(())
}

/// Result of both augmentation tasks
#[derive(Debug)]
pub struct AugmentOutcome {
    pub supplementary: Result<()>,
    pub regions: Result<()>,
}

impl AugmentOutcome {
    /// Both facets were published by this run
    pub fn is_complete(&self) -> bool {
        self.supplementary.is_ok() && self.regions.is_ok()
    }
}

/// Run both tasks on the calling thread
pub fn augment_now(source: &dyn AssetSource, config: &DatabaseConfig, cell: &SnapshotCell) -> AugmentOutcome {
    let outcome = AugmentOutcome {
        supplementary: run_supplementary(source, config, cell),
        regions: run_regions(source, config, cell),
    };
    info!(complete = outcome.is_complete(), "augmentation finished");
    outcome
}

/// Handle to the two spawned augmentation tasks
#[cfg(feature = "async-runtime")]
pub struct AugmentHandle {
    supplementary: tokio::task::JoinHandle<Result<()>>,
    regions: tokio::task::JoinHandle<Result<()>>,
}

#[cfg(feature = "async-runtime")]
impl AugmentHandle {
    /// Wait for both tasks
    pub async fn wait(self) -> AugmentOutcome {
        let supplementary = Self::join(SUPPLEMENTARY_TASK, self.supplementary).await;
        let regions = Self::join(REGIONS_TASK, self.regions).await;
        AugmentOutcome {
            supplementary,
            regions,
        }
    }

    /// Check whether both tasks have finished
    pub fn is_finished(&self) -> bool {
        self.supplementary.is_finished() && self.regions.is_finished()
    }

    async fn join(task: &'static str, handle: tokio::task::JoinHandle<Result<()>>) -> Result<()> {
        handle.await.map_err(|e| {
            let err = PresetError::TaskJoin {
                task,
                reason: e.to_string(),
            };
            warn!(task, error = %err, "background task did not complete");
            err
        })?
    }
}

/// Start both tasks on the current tokio runtime's blocking pool
///
/// Fails when called outside a tokio runtime.
#[cfg(feature = "async-runtime")]
pub fn spawn(
    source: Arc<dyn AssetSource>,
    config: &DatabaseConfig,
    cell: Arc<SnapshotCell>,
) -> Result<AugmentHandle> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|e| PresetError::BackgroundLoadFailed {
        task: "augmentation",
        reason: e.to_string(),
    })?;

    let supplementary = {
        let (source, config, cell) = (Arc::clone(&source), config.clone(), Arc::clone(&cell));
        runtime.spawn_blocking(move || run_supplementary(source.as_ref(), &config, &cell))
    };
    let regions = {
        let config = config.clone();
        runtime.spawn_blocking(move || run_regions(source.as_ref(), &config, &cell))
    };

    Ok(AugmentHandle {
        supplementary,
        regions,
    })
}
