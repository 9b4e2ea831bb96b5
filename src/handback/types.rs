//! Work orders going out to agents and outcome reports coming back.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the agent is authorized to do to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    /// Create a new file.
    Create,
    /// Edit an existing file.
    Modify,
    /// Remove a file.
    Delete,
}

/// A file the agent may touch, with the intended action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    /// Repository-relative path.
    pub path: String,
    /// Intended action.
    pub action: FileAction,
}

/// The handoff: what one task asks an agent to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Task this order was issued for.
    pub task_id: String,
    /// Task title.
    pub title: String,
    /// Statements the outcome must satisfy.
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// Files the agent is authorized to touch.
    #[serde(default)]
    pub files: Vec<FileReference>,
    /// Expected effort in minutes.
    #[serde(default)]
    pub estimated_minutes: u32,
}

/// What actually happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The file was added.
    Created,
    /// The file was edited.
    Modified,
    /// The file was removed.
    Deleted,
}

impl ChangeKind {
    /// Whether this change is what `action` asked for.
    #[must_use]
    pub fn fulfils(self, action: FileAction) -> bool {
        matches!(
            (self, action),
            (Self::Created, FileAction::Create)
                | (Self::Modified, FileAction::Modify)
                | (Self::Deleted, FileAction::Delete)
        )
    }
}

/// One file change reported by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Repository-relative path.
    pub path: String,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Diff or full content, when the agent supplied it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    /// Lines added.
    #[serde(default)]
    pub lines_added: u32,
    /// Lines removed.
    #[serde(default)]
    pub lines_removed: u32,
}

/// A single failing test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    /// Test name.
    pub test_name: String,
    /// Failure message.
    pub message: String,
    /// File and line, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Results of one test suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Suite name.
    pub suite: String,
    /// Passing tests.
    #[serde(default)]
    pub passed: u32,
    /// Failing tests.
    #[serde(default)]
    pub failed: u32,
    /// Skipped tests.
    #[serde(default)]
    pub skipped: u32,
    /// Line coverage percentage, when measured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<f64>,
    /// Wall time in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
    /// Details of each failure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TestFailure>,
}

/// Category of something the agent ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// Work cannot continue.
    Blocker,
    /// Needs an answer from a human.
    Question,
    /// Something learned about the codebase.
    Discovery,
    /// A proposed improvement.
    Suggestion,
}

/// An issue surfaced during the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredIssue {
    /// Category.
    pub kind: IssueKind,
    /// 1 (minor) to 5 (severe).
    pub severity: u8,
    /// What was found.
    pub description: String,
}

/// How sure the agent is of its own work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Confident.
    High,
    /// Somewhat confident.
    #[default]
    Medium,
    /// Unsure.
    Low,
}

impl Confidence {
    /// Ordinal for comparisons, higher is more confident.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

/// Overall verdict derived from an outcome report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Changes made, tests green, reasonably confident.
    Success,
    /// Changes made but something is off.
    Partial,
    /// Nothing was changed.
    Failed,
    /// The agent hit a blocker.
    Blocked,
}

/// The handback: what an agent reports after working a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeReport {
    /// Task the report is for.
    pub task_id: String,
    /// Files touched.
    #[serde(default)]
    pub file_changes: Vec<FileChange>,
    /// Test suites run.
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    /// Issues surfaced.
    #[serde(default)]
    pub issues: Vec<DiscoveredIssue>,
    /// Time actually spent.
    #[serde(default)]
    pub minutes_spent: u32,
    /// Time the agent was given.
    #[serde(default)]
    pub minutes_estimated: u32,
    /// Self-assessed confidence.
    #[serde(default)]
    pub confidence: Confidence,
    /// Free-text account of the work.
    #[serde(default)]
    pub summary: String,
}

impl OutcomeReport {
    /// Derives the outcome status.
    ///
    /// A blocker issue wins over everything; then an empty change set means
    /// failure; then green suites with at least medium confidence mean
    /// success. Anything else is partial.
    #[must_use]
    pub fn status(&self) -> OutcomeStatus {
        if self.issues.iter().any(|i| i.kind == IssueKind::Blocker) {
            OutcomeStatus::Blocked
        } else if self.file_changes.is_empty() {
            OutcomeStatus::Failed
        } else if self.test_results.iter().all(|t| t.failed == 0)
            && self.confidence != Confidence::Low
        {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::Partial
        }
    }
}
