//! Acceptance policy for the handback gate.

use serde::{Deserialize, Serialize};

use super::types::Confidence;

/// Tunable thresholds applied by [`super::validate_handback`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandbackConfig {
    /// A failing test suite rejects the handback. The general rule that no
    /// check other than Acceptance Criteria may fail already covers it.
    pub require_all_tests_pass: bool,
    /// Unmatched acceptance criteria reject the handback.
    pub require_all_criteria_met: bool,
    /// Out-of-scope changes downgrade scope compliance to a warning.
    pub allow_out_of_scope_changes: bool,
    /// Confidence below this produces a warning.
    pub min_confidence_for_auto_accept: Confidence,
    /// Overrun above this percentage fails the time budget.
    pub max_time_overrun_percent: f64,
    /// Average coverage below this fails the coverage check.
    pub min_coverage_percent: f64,
}

impl Default for HandbackConfig {
    fn default() -> Self {
        Self {
            require_all_tests_pass: true,
            require_all_criteria_met: true,
            allow_out_of_scope_changes: false,
            min_confidence_for_auto_accept: Confidence::Medium,
            max_time_overrun_percent: 50.0,
            min_coverage_percent: 80.0,
        }
    }
}

impl HandbackConfig {
    /// Rejects thresholds that cannot be met or make no sense.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_time_overrun_percent.is_nan() || self.max_time_overrun_percent < 0.0 {
            return Err(format!(
                "max_time_overrun_percent must be non-negative, got {}",
                self.max_time_overrun_percent
            ));
        }
        if !(0.0..=100.0).contains(&self.min_coverage_percent) {
            return Err(format!(
                "min_coverage_percent must be between 0 and 100, got {}",
                self.min_coverage_percent
            ));
        }
        Ok(())
    }
}
