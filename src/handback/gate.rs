//! Runs every check and turns them into an accept/reject decision.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::checks::{
    check_confidence, check_coverage, check_criteria, check_scope, check_tests, check_time_budget,
    CheckResult, CheckStatus, ScopeViolation, ACCEPTANCE_CRITERIA, TESTS_PASS,
};
use super::policy::HandbackConfig;
use super::types::{OutcomeReport, OutcomeStatus, WorkOrder};

/// Where the task should go after the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStatus {
    /// Accepted; mark the task completed.
    Done,
    /// The agent hit a blocker; freeze the task and its dependents.
    Blocked,
    /// Tests failed; send the task back for more work.
    InProgress,
    /// Needs a human to review before deciding.
    Verification,
}

impl fmt::Display for NextStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::InProgress => "in_progress",
            Self::Verification => "verification",
        };
        f.write_str(s)
    }
}

/// The gate's full verdict on one handback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Task the handback was for.
    pub task_id: String,
    /// Every check, in evaluation order.
    pub checks: Vec<CheckResult>,
    /// Scope breaches found by the scope check.
    #[serde(default)]
    pub scope_violations: Vec<ScopeViolation>,
    /// Status derived from the outcome report.
    pub outcome_status: OutcomeStatus,
    /// Whether the handback was accepted.
    pub accepted: bool,
    /// Acceptance criteria that matched.
    pub criteria_matched: usize,
    /// Acceptance criteria in the work order.
    pub criteria_total: usize,
    /// One-line human summary.
    pub summary: String,
    /// Recommended next task status.
    pub suggested_status: NextStatus,
}

impl ValidationResult {
    /// Looks up a check by name.
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Checks that failed.
    #[must_use]
    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| c.result == CheckStatus::Fail).collect()
    }
}

/// Validates an agent's outcome report against the work order it was given.
///
/// Always produces a complete result. Identical inputs produce identical
/// results.
#[must_use]
pub fn validate_handback(
    order: &WorkOrder,
    outcome: &OutcomeReport,
    config: &HandbackConfig,
) -> ValidationResult {
    let outcome_status = outcome.status();

    let tests = check_tests(outcome);
    let (criteria, criteria_matched) = check_criteria(order, outcome);
    let (scope, scope_violations) = check_scope(order, outcome, config);
    let checks = vec![
        tests,
        criteria,
        scope,
        check_coverage(outcome, config),
        check_time_budget(outcome, config),
        check_confidence(outcome, config),
    ];

    let failed = |name: &str| checks.iter().any(|c| c.name == name && c.result == CheckStatus::Fail);
    let tests_failed = failed(TESTS_PASS);
    let other_failures =
        checks.iter().any(|c| c.result == CheckStatus::Fail && c.name != ACCEPTANCE_CRITERIA);
    let accepted = !other_failures
        && !(config.require_all_tests_pass && tests_failed)
        && !(config.require_all_criteria_met && failed(ACCEPTANCE_CRITERIA));

    let suggested_status = if accepted {
        NextStatus::Done
    } else if outcome_status == OutcomeStatus::Blocked {
        NextStatus::Blocked
    } else if tests_failed {
        NextStatus::InProgress
    } else {
        NextStatus::Verification
    };

    let summary = summarize(&checks, accepted);
    info!(
        task = %order.task_id,
        accepted,
        suggested = %suggested_status,
        "handback validated"
    );

    ValidationResult {
        task_id: order.task_id.clone(),
        checks,
        scope_violations,
        outcome_status,
        accepted,
        criteria_matched,
        criteria_total: order.acceptance_criteria.len(),
        summary,
        suggested_status,
    }
}

fn summarize(checks: &[CheckResult], accepted: bool) -> String {
    let count = |status: CheckStatus| checks.iter().filter(|c| c.result == status).count();
    let tally = format!(
        "{} passed, {} failed, {} warnings, {} skipped",
        count(CheckStatus::Pass),
        count(CheckStatus::Fail),
        count(CheckStatus::Warning),
        count(CheckStatus::Skip)
    );
    if accepted {
        format!("Accepted: {tally}")
    } else {
        let failed: Vec<&str> = checks
            .iter()
            .filter(|c| c.result == CheckStatus::Fail)
            .map(|c| c.name.as_str())
            .collect();
        if failed.is_empty() {
            format!("Rejected: {tally}")
        } else {
            format!("Rejected ({}): {tally}", failed.join(", "))
        }
    }
}
