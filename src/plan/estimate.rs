//! Effort heuristics.

use super::model::{Feature, FeaturePriority};

const BASE_HOURS: f64 = 4.0;
const HOURS_PER_CRITERION: f64 = 2.0;

/// Rough effort estimate for a feature, in whole hours.
///
/// Four hours base plus two per acceptance criterion, scaled by 1.5 for
/// critical and 1.25 for high priority, rounded up.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimate_feature_hours(feature: &Feature) -> u32 {
    let multiplier = match feature.priority {
        FeaturePriority::Critical => 1.5,
        FeaturePriority::High => 1.25,
        FeaturePriority::Medium | FeaturePriority::Low => 1.0,
    };
    let raw = BASE_HOURS + HOURS_PER_CRITERION * feature.acceptance_criteria.len() as f64;
    (raw * multiplier).ceil() as u32
}
