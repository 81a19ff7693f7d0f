//! Text scoring for search

use crate::registry::{FeatureDefinition, GeometryKind};

/// Relevance of a feature to a free-text query
///
/// `None` excludes the feature. Higher scores rank first.
pub trait TextScorer: Send + Sync {
    fn score(&self, feature: &FeatureDefinition, query: Option<&str>, geometry: GeometryKind) -> Option<i32>;
}

/// Relevance tiers of [`DefaultTextScorer`]
pub mod weights {
    pub const NO_QUERY: i32 = 1;
    pub const NAME_EQUALS: i32 = 100;
    pub const NAME_PREFIX: i32 = 50;
    pub const WORD_PREFIX: i32 = 40;
    pub const TERM_EQUALS: i32 = 30;
    pub const TERM_PREFIX: i32 = 20;
    pub const NAME_CONTAINS: i32 = 10;
}

/// Case-insensitive name, term and alias matching
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTextScorer;

impl TextScorer for DefaultTextScorer {
    fn score(&self, feature: &FeatureDefinition, query: Option<&str>, geometry: GeometryKind) -> Option<i32> {
        if !feature.applies_to(geometry) {
            return None;
        }

        let query = match query.map(str::trim) {
            None | Some("") => return Some(weights::NO_QUERY),
            Some(q) => q.to_lowercase(),
        };
        let name = feature.display_name().to_lowercase();

        if name == query {
            return Some(weights::NAME_EQUALS);
        }
        if name.starts_with(&query) {
            return Some(weights::NAME_PREFIX);
        }
        if name
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word.starts_with(&query))
        {
            return Some(weights::WORD_PREFIX);
        }

        let mut best = None;
        for synonym in feature.terms.iter().chain(&feature.aliases) {
            let synonym = synonym.to_lowercase();
            if synonym == query {
                return Some(weights::TERM_EQUALS);
            }
            if best.is_none() && synonym.starts_with(&query) {
                best = Some(weights::TERM_PREFIX);
            }
        }

        best.or_else(|| name.contains(&query).then_some(weights::NAME_CONTAINS))
    }
}
