//! Search Engine - text, geometry and location filtered search
//!
//! Features are visited in catalogue order (base first, then
//! supplementary). Each one passes three filters in turn:
//!
//! 1. `searchable` must be set
//! 2. the [`TextScorer`] must return a score
//! 3. its location set must admit the search location
//!
//! Hits are returned by descending score; equal scores keep visit order.

mod location;
mod text;

use std::sync::Arc;

pub use location::{LatLon, LocationFilter};
pub use text::{weights, DefaultTextScorer, TextScorer};

use crate::registry::{FeatureDefinition, GeometryKind};

/// A search result
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub feature: Arc<FeatureDefinition>,
    pub score: i32,
}

/// Search parameters
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'q> {
    pub text: Option<&'q str>,
    pub geometry: GeometryKind,
    pub location: LatLon,
}

/// Rank `features` for `query`
pub fn search<'f, I>(
    features: I,
    query: &SearchQuery<'_>,
    scorer: &dyn TextScorer,
    filter: &LocationFilter<'_>,
) -> Vec<SearchHit>
where
    I: IntoIterator<Item = &'f Arc<FeatureDefinition>>,
{
    let mut hits: Vec<SearchHit> = features
        .into_iter()
        .filter(|feature| feature.searchable)
        .filter_map(|feature| {
            let score = scorer.score(feature, query.text, query.geometry)?;
            filter.admits(feature, query.location).then(|| SearchHit {
                feature: Arc::clone(feature),
                score,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits
}
