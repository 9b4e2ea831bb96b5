//! Applies gate decisions and operator actions to a plan and its block state.
//!
//! The blocking manager and the scheduler know nothing of each other. These
//! functions keep the plan's task statuses in step with the manager's
//! records: a task the manager blocks is `blocked` in the plan, and a task it
//! releases goes back to `pending` so the ready set can pick it up.

use serde::Serialize;
use tracing::info;

use crate::blocking::{BlockOutcome, BlockReason, BlockingManager};
use crate::handback::{NextStatus, ValidationResult};
use crate::plan::scheduler::{self, TaskProgressUpdate};
use crate::plan::{ExecutionPlan, TaskStatus};
use crate::ports::clock::Clock;

/// What [`apply_validation`] did to the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedDecision {
    /// Task the validation was for.
    pub task_id: String,
    /// Decision that was applied.
    pub decision: NextStatus,
    /// Tasks moved to `blocked`.
    pub blocked: Vec<String>,
    /// Tasks whose block was lifted.
    pub unblocked: Vec<String>,
    /// Tasks that became ready.
    pub ready: Vec<String>,
}

/// Outcome of [`release_in_plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Release {
    /// A manual hold was removed.
    pub hold_removed: bool,
    /// The task is still blocked afterwards.
    pub still_blocked: bool,
}

fn set_status(plan: &mut ExecutionPlan, id: &str, status: TaskStatus) {
    if let Some(task) = plan.task_mut(id) {
        task.status = status;
    }
}

/// Marks every listed, non-terminal task `blocked`. Returns the ones changed.
fn mirror_blocked(plan: &mut ExecutionPlan, ids: &[String]) -> Vec<String> {
    let mut changed = Vec::new();
    for id in ids {
        if let Some(task) = plan.task_mut(id) {
            if !task.status.is_terminal() && task.status != TaskStatus::Blocked {
                task.status = TaskStatus::Blocked;
                changed.push(id.clone());
            }
        }
    }
    changed
}

/// Returns a `blocked` task to `pending` when the manager no longer blocks it.
fn release_if_clear(plan: &mut ExecutionPlan, manager: &BlockingManager, id: &str) -> bool {
    let blocked_in_plan = plan.task(id).is_some_and(|t| t.status == TaskStatus::Blocked);
    if blocked_in_plan && !manager.is_blocked(id) {
        set_status(plan, id, TaskStatus::Pending);
        return true;
    }
    false
}

/// Applies a validation result's suggested status to the plan.
///
/// Returns `None` if the task is not part of the plan.
pub fn apply_validation(
    plan: &mut ExecutionPlan,
    manager: &mut BlockingManager,
    result: &ValidationResult,
    clock: &dyn Clock,
) -> Option<AppliedDecision> {
    let id = result.task_id.as_str();
    plan.task(id)?;

    let mut applied = AppliedDecision {
        task_id: id.to_string(),
        decision: result.suggested_status,
        blocked: Vec::new(),
        unblocked: Vec::new(),
        ready: Vec::new(),
    };

    match result.suggested_status {
        NextStatus::Done => {
            let completion = complete_in_plan(plan, manager, id, clock)?;
            applied.unblocked = completion.unblocked;
            applied.ready = completion.ready;
        }
        NextStatus::Blocked => {
            let graph = scheduler::dependency_graph(plan);
            let reason = BlockReason::Custom(format!("Handback blocked: {}", result.summary));
            let outcome = manager.block_task(id, &graph, Some(reason), clock);
            applied.blocked = mirror_blocked(plan, &outcome_zone(id, &outcome));
        }
        NextStatus::InProgress | NextStatus::Verification => {
            set_status(plan, id, TaskStatus::InProgress);
        }
    }

    info!(
        plan = %plan.id,
        task = id,
        decision = ?applied.decision,
        blocked = applied.blocked.len(),
        unblocked = applied.unblocked.len(),
        "validation applied"
    );
    Some(applied)
}

/// What completing a task released.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Dependents whose block was lifted.
    pub unblocked: Vec<String>,
    /// Tasks that became ready.
    pub ready: Vec<String>,
}

/// Completes a task, clears its own block state, lifts blocks on dependents
/// whose dependencies are now all completed, and recomputes the ready set.
///
/// Returns `None` if the task is not part of the plan.
pub fn complete_in_plan(
    plan: &mut ExecutionPlan,
    manager: &mut BlockingManager,
    id: &str,
    clock: &dyn Clock,
) -> Option<Completion> {
    plan.task(id)?;
    let before = ready_ids(plan);
    let update = TaskProgressUpdate { task_id: id.to_string(), status: TaskStatus::Completed };
    scheduler::update_task_progress(plan, &update, clock);
    manager.resolve_task(id);

    let mut completion = Completion::default();
    let graph = scheduler::dependency_graph(plan);
    let completed = plan.completed_ids();
    for dependent in graph.dependents_of(id) {
        if !manager.is_blocked(dependent) {
            continue;
        }
        let outcome = manager.unblock_task(dependent, &graph, &completed);
        for lifted in outcome.unblocked {
            if release_if_clear(plan, manager, &lifted) {
                completion.unblocked.push(lifted);
            }
        }
    }
    scheduler::mark_ready_tasks(plan);
    completion.ready = ready_ids(plan).into_iter().filter(|r| !before.contains(r)).collect();
    Some(completion)
}

fn ready_ids(plan: &ExecutionPlan) -> Vec<String> {
    plan.tasks.iter().filter(|t| t.status == TaskStatus::Ready).map(|t| t.id.clone()).collect()
}

/// The target followed by every newly blocked dependent.
fn outcome_zone(id: &str, outcome: &BlockOutcome) -> Vec<String> {
    let mut zone = vec![id.to_string()];
    zone.extend(outcome.newly_blocked.iter().filter(|b| b.as_str() != id).cloned());
    zone
}

/// Blocks a task by hand and cascades through the plan.
///
/// Returns `None` if the task is not part of the plan.
pub fn block_in_plan(
    plan: &mut ExecutionPlan,
    manager: &mut BlockingManager,
    id: &str,
    reason: Option<BlockReason>,
    clock: &dyn Clock,
) -> Option<BlockOutcome> {
    plan.task(id)?;
    let graph = scheduler::dependency_graph(plan);
    let outcome = manager.block_task(id, &graph, reason, clock);
    mirror_blocked(plan, &outcome_zone(id, &outcome));
    Some(outcome)
}

/// Places a manual hold on a task. Returns `false` if the task is unknown or
/// already held.
pub fn hold_in_plan(
    plan: &mut ExecutionPlan,
    manager: &mut BlockingManager,
    id: &str,
    clock: &dyn Clock,
) -> bool {
    if plan.task(id).is_none() || !manager.add_manual_hold(id, clock) {
        return false;
    }
    mirror_blocked(plan, &[id.to_string()]);
    true
}

/// Removes any manual hold on a task and re-evaluates its block.
///
/// Returns `None` if the task is not part of the plan.
pub fn release_in_plan(
    plan: &mut ExecutionPlan,
    manager: &mut BlockingManager,
    id: &str,
) -> Option<Release> {
    plan.task(id)?;
    let hold_removed = manager.remove_manual_hold(id);

    let graph = scheduler::dependency_graph(plan);
    manager.unblock_task(id, &graph, &plan.completed_ids());
    if release_if_clear(plan, manager, id) {
        scheduler::mark_ready_tasks(plan);
    }

    Some(Release { hold_removed, still_blocked: manager.is_blocked(id) })
}
