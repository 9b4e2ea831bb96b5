//! The individual gate checks.
//!
//! Each check is a pure function of the work order, the outcome report and
//! the policy. None of them can fail; a policy breach is a
//! [`CheckStatus::Fail`] result.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::policy::HandbackConfig;
use super::types::{ChangeKind, FileAction, OutcomeReport, WorkOrder};

/// Name of the test-suite check.
pub const TESTS_PASS: &str = "Tests Pass";
/// Name of the acceptance-criteria check.
pub const ACCEPTANCE_CRITERIA: &str = "Acceptance Criteria";
/// Name of the scope check.
pub const SCOPE_COMPLIANCE: &str = "Scope Compliance";
/// Name of the coverage check.
pub const TEST_COVERAGE: &str = "Test Coverage";
/// Name of the time-budget check.
pub const TIME_BUDGET: &str = "Time Budget";
/// Name of the confidence check.
pub const CONFIDENCE_LEVEL: &str = "Confidence Level";

const MIN_KEYWORD_LEN: usize = 4;

/// Verdict of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Requirement met.
    Pass,
    /// Requirement breached.
    Fail,
    /// Nothing to evaluate.
    Skip,
    /// Worth a look, not disqualifying on its own.
    Warning,
}

/// One named check with its verdict and an explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check name.
    pub name: String,
    /// Verdict.
    pub result: CheckStatus,
    /// Human-readable explanation.
    pub details: String,
}

impl CheckResult {
    fn new(name: &str, result: CheckStatus, details: impl Into<String>) -> Self {
        Self { name: name.to_string(), result, details: details.into() }
    }
}

/// Kind of scope breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A changed file was never authorized.
    OutOfScopeFile,
    /// An authorized file was changed in a way the order did not ask for.
    UnrelatedChange,
    /// An authorized file the order expected to change was left alone.
    MissingFile,
}

/// A single scope breach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeViolation {
    /// Kind of breach.
    pub kind: ViolationKind,
    /// Offending path.
    pub path: String,
    /// Why it was flagged.
    pub reason: String,
}

/// Fails when any suite reports a failing test.
#[must_use]
pub fn check_tests(outcome: &OutcomeReport) -> CheckResult {
    if outcome.test_results.is_empty() {
        return CheckResult::new(TESTS_PASS, CheckStatus::Skip, "No test results reported");
    }
    let passed: u32 = outcome.test_results.iter().map(|t| t.passed).sum();
    let failed: u32 = outcome.test_results.iter().map(|t| t.failed).sum();
    let skipped: u32 = outcome.test_results.iter().map(|t| t.skipped).sum();
    let counts = format!("{passed} passed, {failed} failed, {skipped} skipped");

    if failed > 0 {
        CheckResult::new(TESTS_PASS, CheckStatus::Fail, counts)
    } else {
        CheckResult::new(TESTS_PASS, CheckStatus::Pass, counts)
    }
}

/// Lower-cased alphanumeric words of at least four characters.
fn keywords(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

/// Matches each acceptance criterion against the summary and changed paths.
///
/// A criterion counts as met when any of its keywords appears in the
/// haystack. Returns the check with the matched count.
#[must_use]
pub fn check_criteria(order: &WorkOrder, outcome: &OutcomeReport) -> (CheckResult, usize) {
    let total = order.acceptance_criteria.len();
    if total == 0 {
        return (
            CheckResult::new(ACCEPTANCE_CRITERIA, CheckStatus::Skip, "No acceptance criteria"),
            0,
        );
    }

    let mut haystack = outcome.summary.to_lowercase();
    for change in &outcome.file_changes {
        haystack.push('\n');
        haystack.push_str(&change.path.to_lowercase());
    }

    let matched = order
        .acceptance_criteria
        .iter()
        .filter(|criterion| keywords(criterion).iter().any(|word| haystack.contains(word.as_str())))
        .count();

    let details = format!("{matched}/{total} criteria matched");
    let result = if matched == total {
        CheckStatus::Pass
    } else if matched == 0 {
        CheckStatus::Fail
    } else {
        CheckStatus::Warning
    };
    (CheckResult::new(ACCEPTANCE_CRITERIA, result, details), matched)
}

/// Compares changed files against the authorized set.
///
/// Violations are listed changed files first, in report order, then missing
/// files in work-order order.
#[must_use]
pub fn check_scope(
    order: &WorkOrder,
    outcome: &OutcomeReport,
    config: &HandbackConfig,
) -> (CheckResult, Vec<ScopeViolation>) {
    let authorized: HashMap<&str, FileAction> =
        order.files.iter().map(|f| (f.path.as_str(), f.action)).collect();
    let changed: HashSet<&str> = outcome.file_changes.iter().map(|c| c.path.as_str()).collect();
    let mut violations = Vec::new();

    for change in &outcome.file_changes {
        match authorized.get(change.path.as_str()) {
            None => violations.push(ScopeViolation {
                kind: ViolationKind::OutOfScopeFile,
                path: change.path.clone(),
                reason: "File was changed but is not in the work order".to_string(),
            }),
            Some(&action) if !change.kind.fulfils(action) => violations.push(ScopeViolation {
                kind: ViolationKind::UnrelatedChange,
                path: change.path.clone(),
                reason: format!(
                    "Work order asked to {} the file but it was {}",
                    action_verb(action),
                    change_verb(change.kind)
                ),
            }),
            Some(_) => {}
        }
    }

    for file in &order.files {
        if file.action != FileAction::Delete && !changed.contains(file.path.as_str()) {
            violations.push(ScopeViolation {
                kind: ViolationKind::MissingFile,
                path: file.path.clone(),
                reason: format!(
                    "Work order asked to {} the file but it was not touched",
                    action_verb(file.action)
                ),
            });
        }
    }

    let result = if violations.is_empty() {
        CheckResult::new(SCOPE_COMPLIANCE, CheckStatus::Pass, "All changes within scope")
    } else {
        let status = if config.allow_out_of_scope_changes {
            CheckStatus::Warning
        } else {
            CheckStatus::Fail
        };
        CheckResult::new(SCOPE_COMPLIANCE, status, format!("{} scope violation(s)", violations.len()))
    };
    (result, violations)
}

fn action_verb(action: FileAction) -> &'static str {
    match action {
        FileAction::Create => "create",
        FileAction::Modify => "modify",
        FileAction::Delete => "delete",
    }
}

fn change_verb(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Created => "created",
        ChangeKind::Modified => "modified",
        ChangeKind::Deleted => "deleted",
    }
}

/// Averages reported coverage against the configured minimum.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn check_coverage(outcome: &OutcomeReport, config: &HandbackConfig) -> CheckResult {
    let values: Vec<f64> = outcome.test_results.iter().filter_map(|t| t.coverage).collect();
    if values.is_empty() {
        return CheckResult::new(TEST_COVERAGE, CheckStatus::Skip, "No coverage reported");
    }
    let average = values.iter().sum::<f64>() / values.len() as f64;
    let details =
        format!("Average coverage {average:.1}% (minimum {:.1}%)", config.min_coverage_percent);
    if average >= config.min_coverage_percent {
        CheckResult::new(TEST_COVERAGE, CheckStatus::Pass, details)
    } else {
        CheckResult::new(TEST_COVERAGE, CheckStatus::Fail, details)
    }
}

/// Compares time spent with the estimate.
#[must_use]
pub fn check_time_budget(outcome: &OutcomeReport, config: &HandbackConfig) -> CheckResult {
    if outcome.minutes_estimated == 0 {
        return CheckResult::new(TIME_BUDGET, CheckStatus::Skip, "No time estimate");
    }
    let spent = f64::from(outcome.minutes_spent);
    let estimated = f64::from(outcome.minutes_estimated);
    let overrun = (spent - estimated) / estimated * 100.0;
    let details = format!(
        "{} of {} minutes used ({overrun:+.0}%)",
        outcome.minutes_spent, outcome.minutes_estimated
    );

    let result = if overrun <= 0.0 {
        CheckStatus::Pass
    } else if overrun <= config.max_time_overrun_percent {
        CheckStatus::Warning
    } else {
        CheckStatus::Fail
    };
    CheckResult::new(TIME_BUDGET, result, details)
}

/// Warns when the agent's confidence is below the auto-accept threshold.
#[must_use]
pub fn check_confidence(outcome: &OutcomeReport, config: &HandbackConfig) -> CheckResult {
    let minimum = config.min_confidence_for_auto_accept;
    if outcome.confidence.rank() >= minimum.rank() {
        CheckResult::new(CONFIDENCE_LEVEL, CheckStatus::Pass, "Confidence meets threshold")
    } else {
        CheckResult::new(
            CONFIDENCE_LEVEL,
            CheckStatus::Warning,
            format!("Confidence {} is below {minimum}", outcome.confidence),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handback::types::{Confidence, FileChange, FileReference, TestResult};

    fn order(criteria: &[&str], files: &[(&str, FileAction)]) -> WorkOrder {
        WorkOrder {
            task_id: "task-login".into(),
            title: "Login".into(),
            acceptance_criteria: criteria.iter().map(|c| (*c).to_string()).collect(),
            files: files
                .iter()
                .map(|(path, action)| FileReference { path: (*path).into(), action: *action })
                .collect(),
            estimated_minutes: 30,
        }
    }

    fn change(path: &str, kind: ChangeKind) -> FileChange {
        FileChange { path: path.into(), kind, diff: None, lines_added: 1, lines_removed: 0 }
    }

    fn suite(passed: u32, failed: u32, coverage: Option<f64>) -> TestResult {
        TestResult {
            suite: "unit".into(),
            passed,
            failed,
            skipped: 0,
            coverage,
            duration_ms: 10,
            failures: Vec::new(),
        }
    }

    fn outcome() -> OutcomeReport {
        OutcomeReport {
            task_id: "task-login".into(),
            file_changes: Vec::new(),
            test_results: Vec::new(),
            issues: Vec::new(),
            minutes_spent: 0,
            minutes_estimated: 0,
            confidence: Confidence::High,
            summary: String::new(),
        }
    }

    #[test]
    fn tests_check_sums_every_suite() {
        let mut report = outcome();
        report.test_results = vec![suite(3, 0, None), suite(2, 1, None)];
        let check = check_tests(&report);
        assert_eq!(check.result, CheckStatus::Fail);
        assert_eq!(check.details, "5 passed, 1 failed, 0 skipped");
    }

    #[test]
    fn tests_check_skips_without_results() {
        assert_eq!(check_tests(&outcome()).result, CheckStatus::Skip);
    }

    #[test]
    fn keywords_ignore_short_words_and_case() {
        assert_eq!(keywords("User can LOG in via OAuth-tokens"), vec!["user", "oauth", "tokens"]);
    }

    #[test]
    fn criteria_match_summary_or_paths() {
        let order = order(&["Password reset email is sent", "Session expires"], &[]);
        let mut report = outcome();
        report.summary = "Implemented the reset flow".into();
        report.file_changes = vec![change("src/session.rs", ChangeKind::Modified)];

        let (check, matched) = check_criteria(&order, &report);
        assert_eq!(matched, 2);
        assert_eq!(check.result, CheckStatus::Pass);
    }

    #[test]
    fn criteria_partial_match_warns_and_none_fails() {
        let order = order(&["Password reset works", "Audit trail recorded"], &[]);
        let mut report = outcome();
        report.summary = "password flow".into();
        let (check, matched) = check_criteria(&order, &report);
        assert_eq!((check.result, matched), (CheckStatus::Warning, 1));

        report.summary = "nothing relevant".into();
        let (check, matched) = check_criteria(&order, &report);
        assert_eq!((check.result, matched), (CheckStatus::Fail, 0));
    }

    #[test]
    fn criterion_without_long_words_never_matches() {
        let order = order(&["It is ok"], &[]);
        let mut report = outcome();
        report.summary = "it is ok".into();
        let (check, matched) = check_criteria(&order, &report);
        assert_eq!((check.result, matched), (CheckStatus::Fail, 0));
    }

    #[test]
    fn scope_flags_out_of_scope_and_missing_files() {
        let order = order(&[], &[("a.ts", FileAction::Modify), ("a.test.ts", FileAction::Create)]);
        let mut report = outcome();
        report.file_changes =
            vec![change("a.ts", ChangeKind::Modified), change("b.ts", ChangeKind::Created)];

        let (check, violations) = check_scope(&order, &report, &HandbackConfig::default());

        assert_eq!(check.result, CheckStatus::Fail);
        let kinds: Vec<(ViolationKind, &str)> =
            violations.iter().map(|v| (v.kind, v.path.as_str())).collect();
        assert_eq!(
            kinds,
            vec![(ViolationKind::OutOfScopeFile, "b.ts"), (ViolationKind::MissingFile, "a.test.ts")]
        );
    }

    #[test]
    fn scope_flags_contradicting_change_kind() {
        let order = order(&[], &[("old.rs", FileAction::Modify)]);
        let mut report = outcome();
        report.file_changes = vec![change("old.rs", ChangeKind::Deleted)];

        let (_, violations) = check_scope(&order, &report, &HandbackConfig::default());

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnrelatedChange);
        assert_eq!(violations[0].reason, "Work order asked to modify the file but it was deleted");
    }

    #[test]
    fn untouched_delete_target_is_not_missing() {
        let order = order(&[], &[("gone.rs", FileAction::Delete)]);
        let (check, violations) = check_scope(&order, &outcome(), &HandbackConfig::default());
        assert!(violations.is_empty());
        assert_eq!(check.result, CheckStatus::Pass);
    }

    #[test]
    fn allowed_out_of_scope_downgrades_to_warning() {
        let order = order(&[], &[]);
        let mut report = outcome();
        report.file_changes = vec![change("extra.rs", ChangeKind::Created)];
        let config = HandbackConfig { allow_out_of_scope_changes: true, ..HandbackConfig::default() };

        let (check, violations) = check_scope(&order, &report, &config);
        assert_eq!(check.result, CheckStatus::Warning);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn coverage_is_averaged_over_reporting_suites() {
        let mut report = outcome();
        report.test_results = vec![suite(1, 0, Some(90.0)), suite(1, 0, Some(72.0)), suite(1, 0, None)];
        let check = check_coverage(&report, &HandbackConfig::default());
        assert_eq!(check.result, CheckStatus::Pass);
        assert_eq!(check.details, "Average coverage 81.0% (minimum 80.0%)");

        report.test_results[0].coverage = Some(70.0);
        assert_eq!(check_coverage(&report, &HandbackConfig::default()).result, CheckStatus::Fail);
    }

    #[test]
    fn time_budget_bands() {
        let config = HandbackConfig::default();
        let mut report = outcome();
        assert_eq!(check_time_budget(&report, &config).result, CheckStatus::Skip);

        report.minutes_estimated = 30;
        report.minutes_spent = 25;
        assert_eq!(check_time_budget(&report, &config).result, CheckStatus::Pass);
        report.minutes_spent = 40;
        assert_eq!(check_time_budget(&report, &config).result, CheckStatus::Warning);
        report.minutes_spent = 45;
        assert_eq!(check_time_budget(&report, &config).result, CheckStatus::Warning);
        report.minutes_spent = 46;
        assert_eq!(check_time_budget(&report, &config).result, CheckStatus::Fail);
    }

    #[test]
    fn low_confidence_only_warns() {
        let mut report = outcome();
        report.confidence = Confidence::Low;
        let check = check_confidence(&report, &HandbackConfig::default());
        assert_eq!(check.result, CheckStatus::Warning);
        assert_eq!(check.details, "Confidence low is below medium");

        report.confidence = Confidence::Medium;
        assert_eq!(check_confidence(&report, &HandbackConfig::default()).result, CheckStatus::Pass);
    }
}
