//! Tag Matcher - picks the preset that best describes a tag set
//!
//! Candidates come from the tag index buckets of the object's keys plus the
//! catch-all bucket. Each candidate is scored; the strictly highest positive
//! score wins, so among equal scores the first candidate seen is kept.
//!
//! Probe order is deterministic: object tag keys in sorted order, then the
//! catch-all key, each bucket in catalogue order.

use std::sync::Arc;

use crate::index::{TagIndex, CATCH_ALL_KEY};
use crate::registry::{FeatureDefinition, GeometryKind, Tags};

/// Value that accepts any tag value
pub const ANY_VALUE: &str = "*";

/// Suffix that turns a preset key into a key prefix
pub const KEY_WILDCARD: char = '*';

/// Score breakdown of one candidate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchScore {
    /// 1.0 when the geometry applies, else 0
    pub base: f64,
    /// Contribution of the preset's defining tags
    pub tag_score: f64,
    /// Contribution of extra `add_tags` present on the object
    pub add_tag_score: f64,
}

impl MatchScore {
    /// Total score used for ranking
    pub fn total(&self) -> f64 {
        self.base + self.tag_score + self.add_tag_score
    }

    /// Eligible candidates score strictly above zero
    pub fn is_eligible(&self) -> bool {
        self.total() > 0.0
    }
}

/// Winning candidate and its score
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub feature: Arc<FeatureDefinition>,
    pub score: MatchScore,
}

fn object_value<'a>(tags: &'a Tags, key: &str) -> Option<&'a str> {
    match key.strip_suffix(KEY_WILDCARD) {
        Some(prefix) => tags
            .iter()
            .find(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.as_str()),
        None => tags.get(key).map(String::as_str),
    }
}

/// Score `feature` against an object's tags and geometry
///
/// - geometry not listed: zero
/// - each defining tag: `match_score` when equal, half of it when the preset
///   value is `*`, and zero overall when missing or different
/// - each `add_tags` pair outside the defining tags that the object carries:
///   `match_score`
pub fn score(feature: &FeatureDefinition, tags: &Tags, geometry: GeometryKind) -> MatchScore {
    if !feature.applies_to(geometry) {
        return MatchScore::default();
    }

    let weight = feature.match_score;
    let mut result = MatchScore {
        base: 1.0,
        ..Default::default()
    };

    for (key, expected) in &feature.tags {
        match object_value(tags, key) {
            Some(actual) if actual == expected => result.tag_score += weight,
            Some(_) if expected == ANY_VALUE => result.tag_score += weight / 2.0,
            _ => return MatchScore::default(),
        }
    }

    for (key, expected) in &feature.add_tags {
        if feature.tags.contains_key(key) {
            continue;
        }
        if tags.get(key) == Some(expected) {
            result.add_tag_score += weight;
        }
    }

    result
}

/// Best match for `tags` among the candidates of `index`
pub fn best_match(index: &TagIndex, tags: &Tags, geometry: GeometryKind) -> Option<MatchResult> {
    let mut best: Option<MatchResult> = None;
    let mut best_total = 0.0;

    let keys = tags.keys().map(String::as_str).chain(std::iter::once(CATCH_ALL_KEY));
    for key in keys {
        for feature in index.candidates(key) {
            let candidate = score(feature, tags, geometry);
            let total = candidate.total();
            if total > best_total {
                best_total = total;
                best = Some(MatchResult {
                    feature: Arc::clone(feature),
                    score: candidate,
                });
            }
        }
    }

    best
}
