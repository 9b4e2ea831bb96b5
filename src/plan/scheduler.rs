//! Plan lifecycle, task progress, and read-only projections.
//!
//! Every function takes the plan explicitly; there is no shared scheduler
//! state. Callers serialize mutations per plan.

use serde::Serialize;
use tracing::{debug, info};

use super::task::{ExecutionPlan, ExecutionTask, PlanStatus, TaskStatus};
use crate::graph::DependencyGraph;
use crate::ports::clock::Clock;

/// Hours assumed for a task without an estimate.
pub const DEFAULT_TASK_HOURS: f64 = 4.0;

/// A status change reported for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProgressUpdate {
    /// Task to update.
    pub task_id: String,
    /// New status.
    pub status: TaskStatus,
}

/// A task that cannot run yet, with what it is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedTask {
    /// The waiting task.
    pub task_id: String,
    /// Its title.
    pub title: String,
    /// Its current status (`blocked` or `pending`).
    pub status: TaskStatus,
    /// Dependencies that are not yet completed.
    pub waiting_on: Vec<String>,
}

/// Aggregate progress of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanProgress {
    /// Number of tasks.
    pub total: usize,
    /// Tasks waiting on dependencies.
    pub pending: usize,
    /// Tasks ready to pick up.
    pub ready: usize,
    /// Tasks being worked on.
    pub in_progress: usize,
    /// Frozen tasks.
    pub blocked: usize,
    /// Accepted tasks.
    pub completed: usize,
    /// Abandoned tasks.
    pub cancelled: usize,
    /// `completed / total`, rounded; 0 for an empty plan.
    pub percentage: u32,
    /// Estimated hours left across non-terminal tasks.
    pub estimated_remaining_hours: f64,
}

fn dependencies_completed(plan: &ExecutionPlan, task: &ExecutionTask) -> bool {
    task.dependencies.iter().all(|dep| {
        plan.task(dep).is_some_and(|t| t.status == TaskStatus::Completed)
    })
}

/// Moves every pending task whose dependencies are all completed to ready.
///
/// Returns the IDs that transitioned, in task order.
pub fn mark_ready_tasks(plan: &mut ExecutionPlan) -> Vec<String> {
    let eligible: Vec<String> = plan
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Pending && dependencies_completed(plan, t))
        .map(|t| t.id.clone())
        .collect();

    for id in &eligible {
        if let Some(task) = plan.task_mut(id) {
            task.status = TaskStatus::Ready;
        }
    }
    if !eligible.is_empty() {
        debug!(plan = %plan.id, ready = ?eligible, "tasks became ready");
    }
    eligible
}

fn is_terminal(plan: &ExecutionPlan) -> bool {
    matches!(plan.status, PlanStatus::Completed | PlanStatus::Cancelled)
}

/// Activates a draft or paused plan, stamps the start time on first start,
/// and computes the ready set. Returns `false` for any other state.
pub fn start_execution(plan: &mut ExecutionPlan, clock: &dyn Clock) -> bool {
    if !matches!(plan.status, PlanStatus::Draft | PlanStatus::Paused) {
        return false;
    }
    plan.status = PlanStatus::Active;
    if plan.started_at.is_none() {
        plan.started_at = Some(clock.now());
    }
    mark_ready_tasks(plan);
    info!(plan = %plan.id, "execution started");
    true
}

/// Pauses an active plan without touching any task.
pub fn pause_execution(plan: &mut ExecutionPlan) -> bool {
    if plan.status != PlanStatus::Active {
        return false;
    }
    plan.status = PlanStatus::Paused;
    info!(plan = %plan.id, "execution paused");
    true
}

/// Resumes a paused plan and recomputes the ready set.
pub fn resume_execution(plan: &mut ExecutionPlan) -> bool {
    if plan.status != PlanStatus::Paused {
        return false;
    }
    plan.status = PlanStatus::Active;
    mark_ready_tasks(plan);
    info!(plan = %plan.id, "execution resumed");
    true
}

/// Cancels the plan and every task not already completed. Irreversible.
pub fn cancel_execution(plan: &mut ExecutionPlan) -> bool {
    if is_terminal(plan) {
        return false;
    }
    plan.status = PlanStatus::Cancelled;
    for task in &mut plan.tasks {
        if task.status != TaskStatus::Completed {
            task.status = TaskStatus::Cancelled;
        }
    }
    info!(plan = %plan.id, "execution cancelled");
    true
}

/// Overwrites a task's status. Returns `false` if the task does not exist.
///
/// Completing a task recomputes the ready set; completing the last task
/// completes the plan.
pub fn update_task_progress(
    plan: &mut ExecutionPlan,
    update: &TaskProgressUpdate,
    clock: &dyn Clock,
) -> bool {
    let Some(task) = plan.task_mut(&update.task_id) else {
        return false;
    };
    task.status = update.status;
    debug!(plan = %plan.id, task = %update.task_id, status = %update.status, "task updated");

    if update.status == TaskStatus::Completed {
        mark_ready_tasks(plan);
        if plan.tasks.iter().all(|t| t.status == TaskStatus::Completed) {
            plan.status = PlanStatus::Completed;
            plan.completed_at = Some(clock.now());
            info!(plan = %plan.id, "all tasks completed");
        }
    }
    true
}

/// Ready tasks, highest priority first, at most `limit`.
#[must_use]
pub fn next_tasks(plan: &ExecutionPlan, limit: usize) -> Vec<&ExecutionTask> {
    let mut ready: Vec<&ExecutionTask> =
        plan.tasks.iter().filter(|t| t.status == TaskStatus::Ready).collect();
    ready.sort_by_key(|t| t.priority);
    ready.truncate(limit);
    ready
}

/// Blocked or pending tasks with their outstanding dependencies.
///
/// Tasks with nothing outstanding are omitted.
#[must_use]
pub fn blocked_tasks(plan: &ExecutionPlan) -> Vec<BlockedTask> {
    plan.tasks
        .iter()
        .filter(|t| matches!(t.status, TaskStatus::Blocked | TaskStatus::Pending))
        .filter_map(|t| {
            let waiting_on: Vec<String> = t
                .dependencies
                .iter()
                .filter(|dep| !plan.task(dep).is_some_and(|d| d.status == TaskStatus::Completed))
                .cloned()
                .collect();
            (!waiting_on.is_empty()).then(|| BlockedTask {
                task_id: t.id.clone(),
                title: t.title.clone(),
                status: t.status,
                waiting_on,
            })
        })
        .collect()
}

/// Counts per status, completion percentage, and remaining effort.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_progress(plan: &ExecutionPlan) -> PlanProgress {
    let count = |status: TaskStatus| plan.tasks.iter().filter(|t| t.status == status).count();
    let total = plan.tasks.len();
    let completed = count(TaskStatus::Completed);
    let percentage =
        if total == 0 { 0 } else { (completed as f64 / total as f64 * 100.0).round() as u32 };
    let estimated_remaining_hours = plan
        .tasks
        .iter()
        .filter(|t| !t.status.is_terminal())
        .map(|t| t.estimated_hours.unwrap_or(DEFAULT_TASK_HOURS))
        .sum();

    PlanProgress {
        total,
        pending: count(TaskStatus::Pending),
        ready: count(TaskStatus::Ready),
        in_progress: count(TaskStatus::InProgress),
        blocked: count(TaskStatus::Blocked),
        completed,
        cancelled: count(TaskStatus::Cancelled),
        percentage,
        estimated_remaining_hours,
    }
}

/// Projects the plan's dependency map into a graph for the blocking manager.
#[must_use]
pub fn dependency_graph(plan: &ExecutionPlan) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for task in &plan.tasks {
        graph.add_node(&task.id);
    }
    for (dependent, dependencies) in &plan.dependencies {
        for dependency in dependencies {
            graph.add_dependency(dependent, dependency);
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::SteppingClock;
    use crate::plan::task::SourceType;
    use chrono::{TimeZone, Utc};
    use std::collections::{BTreeMap, BTreeSet};

    fn clock() -> SteppingClock {
        SteppingClock::fixed(Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap())
    }

    fn task(id: &str, priority: u8, deps: &[&str], hours: Option<f64>) -> ExecutionTask {
        ExecutionTask {
            id: id.into(),
            source_type: SourceType::Feature,
            source_id: id.into(),
            title: format!("Task {id}"),
            description: String::new(),
            priority,
            dependencies: deps.iter().map(|d| (*d).to_string()).collect(),
            tags: BTreeSet::new(),
            estimated_hours: hours,
            status: TaskStatus::Pending,
        }
    }

    /// A <- B <- C, plus an independent high-priority D.
    fn plan() -> ExecutionPlan {
        let tasks = vec![
            task("A", 3, &[], Some(2.0)),
            task("B", 3, &["A"], None),
            task("C", 3, &["B"], Some(1.5)),
            task("D", 1, &[], Some(3.0)),
        ];
        let dependencies: BTreeMap<String, Vec<String>> =
            tasks.iter().map(|t| (t.id.clone(), t.dependencies.clone())).collect();
        ExecutionPlan {
            id: "plan-001".into(),
            name: "Demo".into(),
            tasks,
            dependencies,
            execution_order: vec!["D".into(), "A".into(), "B".into(), "C".into()],
            status: PlanStatus::Draft,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
            started_at: None,
            completed_at: None,
        }
    }

    fn complete(plan: &mut ExecutionPlan, id: &str) -> bool {
        update_task_progress(
            plan,
            &TaskProgressUpdate { task_id: id.into(), status: TaskStatus::Completed },
            &clock(),
        )
    }

    fn status(plan: &ExecutionPlan, id: &str) -> TaskStatus {
        plan.task(id).unwrap().status
    }

    #[test]
    fn start_marks_dependency_free_tasks_ready() {
        let mut plan = plan();
        assert!(start_execution(&mut plan, &clock()));

        assert_eq!(plan.status, PlanStatus::Active);
        assert_eq!(plan.started_at, Some(clock().now()));
        assert_eq!(status(&plan, "A"), TaskStatus::Ready);
        assert_eq!(status(&plan, "D"), TaskStatus::Ready);
        assert_eq!(status(&plan, "B"), TaskStatus::Pending);
    }

    #[test]
    fn completion_ripples_readiness_forward() {
        let mut plan = plan();
        start_execution(&mut plan, &clock());

        assert!(complete(&mut plan, "A"));
        assert_eq!(status(&plan, "B"), TaskStatus::Ready);
        assert_eq!(status(&plan, "C"), TaskStatus::Pending);
    }

    #[test]
    fn non_completion_update_does_not_recompute_ready_set() {
        let mut plan = plan();
        start_execution(&mut plan, &clock());
        let update = TaskProgressUpdate { task_id: "A".into(), status: TaskStatus::InProgress };

        assert!(update_task_progress(&mut plan, &update, &clock()));
        assert_eq!(status(&plan, "A"), TaskStatus::InProgress);
        assert_eq!(status(&plan, "B"), TaskStatus::Pending);
    }

    #[test]
    fn unknown_task_update_returns_false() {
        let mut plan = plan();
        assert!(!complete(&mut plan, "nope"));
    }

    #[test]
    fn completing_every_task_completes_plan() {
        let mut plan = plan();
        start_execution(&mut plan, &clock());
        for id in ["D", "A", "B", "C"] {
            complete(&mut plan, id);
        }
        assert_eq!(plan.status, PlanStatus::Completed);
        assert!(plan.completed_at.is_some());
    }

    #[test]
    fn pause_and_resume() {
        let mut plan = plan();
        assert!(!pause_execution(&mut plan));
        start_execution(&mut plan, &clock());
        assert!(pause_execution(&mut plan));
        assert_eq!(plan.status, PlanStatus::Paused);
        assert!(!pause_execution(&mut plan));
        assert!(resume_execution(&mut plan));
        assert_eq!(plan.status, PlanStatus::Active);
    }

    #[test]
    fn cancel_is_terminal_and_spares_completed_tasks() {
        let mut plan = plan();
        start_execution(&mut plan, &clock());
        complete(&mut plan, "A");

        assert!(cancel_execution(&mut plan));

        assert_eq!(plan.status, PlanStatus::Cancelled);
        assert_eq!(status(&plan, "A"), TaskStatus::Completed);
        assert_eq!(status(&plan, "B"), TaskStatus::Cancelled);
        assert!(!start_execution(&mut plan, &clock()));
        assert!(!resume_execution(&mut plan));
        assert!(!cancel_execution(&mut plan));
    }

    #[test]
    fn next_tasks_sorted_by_priority_and_limited() {
        let mut plan = plan();
        start_execution(&mut plan, &clock());

        let next: Vec<&str> = next_tasks(&plan, 5).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(next, vec!["D", "A"]);
        assert_eq!(next_tasks(&plan, 1).len(), 1);
    }

    #[test]
    fn blocked_tasks_lists_outstanding_dependencies() {
        let mut plan = plan();
        start_execution(&mut plan, &clock());
        complete(&mut plan, "A");
        plan.task_mut("B").unwrap().status = TaskStatus::Blocked;

        let blocked = blocked_tasks(&plan);

        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].task_id, "C");
        assert_eq!(blocked[0].waiting_on, vec!["B"]);
    }

    #[test]
    fn progress_counts_and_remaining_hours() {
        let mut plan = plan();
        start_execution(&mut plan, &clock());
        complete(&mut plan, "A");

        let progress = calculate_progress(&plan);

        assert_eq!(progress.total, 4);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.ready, 2);
        assert_eq!(progress.pending, 1);
        assert_eq!(progress.percentage, 25);
        // B has no estimate (4h default) + C 1.5h + D 3h.
        assert!((progress.estimated_remaining_hours - 8.5).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_of_empty_plan_is_zero() {
        let mut plan = plan();
        plan.tasks.clear();
        let progress = calculate_progress(&plan);
        assert_eq!(progress.percentage, 0);
        assert_eq!(progress.total, 0);
    }

    #[test]
    fn dependency_graph_mirrors_plan_edges() {
        let graph = dependency_graph(&plan());
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.dependents_of("A"), vec!["B"]);
        assert_eq!(graph.transitive_dependents("A"), vec!["B", "C"]);
        assert!(graph.dependencies_of("D").is_empty());
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        let mut plan = plan();
        plan.tasks.truncate(3);
        plan.tasks[0].status = TaskStatus::Completed;
        plan.tasks[1].status = TaskStatus::Completed;
        assert_eq!(calculate_progress(&plan).percentage, 67);
    }
}
