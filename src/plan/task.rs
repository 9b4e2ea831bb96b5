//! Execution task and plan types.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which plan entity a task was synthesized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    /// A feature.
    Feature,
    /// A user story.
    UserStory,
    /// A developer story.
    DeveloperStory,
    /// An acceptance or success criterion.
    Criterion,
}

/// Lifecycle state of one execution task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Waiting on dependencies.
    #[default]
    Pending,
    /// All dependencies completed; can be picked up.
    Ready,
    /// An agent is working on it.
    InProgress,
    /// Frozen by a failure upstream or an operator hold.
    Blocked,
    /// Accepted.
    Completed,
    /// Abandoned with its plan.
    Cancelled,
}

impl TaskStatus {
    /// Completed and cancelled tasks never change again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::InProgress => "in-progress",
            Self::Blocked => "blocked",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "ready" => Ok(Self::Ready),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!(
                "unknown task status '{other}' (expected pending, ready, in-progress, blocked, completed, or cancelled)"
            )),
        }
    }
}

/// Overall state of an execution plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanStatus {
    /// Built but not started.
    #[default]
    Draft,
    /// Tasks are being handed out.
    Active,
    /// Temporarily halted.
    Paused,
    /// Every task completed.
    Completed,
    /// Abandoned; terminal.
    Cancelled,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One schedulable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTask {
    /// Unique task identifier.
    pub id: String,
    /// Kind of plan entity this task came from.
    pub source_type: SourceType,
    /// Identifier of that plan entity.
    pub source_id: String,
    /// Short title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Scheduling priority, 1 being the highest.
    pub priority: u8,
    /// IDs of tasks that must complete first.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Free-text labels.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Estimated effort in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    /// Current lifecycle state.
    #[serde(default)]
    pub status: TaskStatus,
}

/// The executable form of a submitted project plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Unique plan identifier.
    pub id: String,
    /// Project name carried over from the submitted plan.
    pub name: String,
    /// Tasks in synthesis order.
    pub tasks: Vec<ExecutionTask>,
    /// Task ID to the IDs it depends on.
    pub dependencies: BTreeMap<String, Vec<String>>,
    /// Dependency- and priority-respecting order. Tasks caught in a cycle are
    /// absent.
    pub execution_order: Vec<String>,
    /// Overall state.
    pub status: PlanStatus,
    /// When the plan was built.
    pub created_at: DateTime<Utc>,
    /// When execution first started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the last task completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExecutionPlan {
    /// Looks up a task by ID.
    #[must_use]
    pub fn task(&self, id: &str) -> Option<&ExecutionTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Looks up a task by ID for mutation.
    pub fn task_mut(&mut self, id: &str) -> Option<&mut ExecutionTask> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// IDs of every completed task.
    #[must_use]
    pub fn completed_ids(&self) -> HashSet<String> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .map(|t| t.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_both_spellings_of_in_progress() {
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_display_matches_serialized_form() {
        for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Cancelled] {
            let yaml = serde_yaml::to_string(&status).unwrap();
            assert_eq!(yaml.trim(), status.to_string());
        }
    }

    #[test]
    fn completed_ids_collects_only_completed_tasks() {
        use chrono::TimeZone;

        let task = |id: &str, status: TaskStatus| ExecutionTask {
            id: id.into(),
            source_type: SourceType::Feature,
            source_id: id.into(),
            title: id.into(),
            description: String::new(),
            priority: 3,
            dependencies: Vec::new(),
            tags: BTreeSet::new(),
            estimated_hours: None,
            status,
        };
        let plan = ExecutionPlan {
            id: "plan-001".into(),
            name: "Ids".into(),
            tasks: vec![
                task("a", TaskStatus::Completed),
                task("b", TaskStatus::Blocked),
                task("c", TaskStatus::Completed),
            ],
            dependencies: BTreeMap::new(),
            execution_order: Vec::new(),
            status: PlanStatus::Active,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            started_at: None,
            completed_at: None,
        };

        assert_eq!(plan.completed_ids(), HashSet::from(["a".to_string(), "c".to_string()]));
    }

    #[test]
    fn terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Blocked.is_terminal());
    }
}
