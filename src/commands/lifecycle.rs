//! Plan lifecycle commands: `start`, `pause`, `resume`, `cancel`, `update`.

use std::path::Path;

use super::load_plan;
use crate::context::ServiceContext;
use crate::coordinator;
use crate::plan::scheduler::{self, TaskProgressUpdate};
use crate::plan::{ExecutionPlan, TaskStatus};
use crate::store::PlanStore;

/// Loads the plan, applies a lifecycle transition, and saves it when the
/// transition was allowed.
fn transition(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    verb: &str,
    apply: impl FnOnce(&mut ExecutionPlan) -> bool,
) -> Result<(), String> {
    let store = PlanStore::new(ctx, root);
    let mut plan = load_plan(&store, plan_id)?;
    if !apply(&mut plan) {
        return Err(format!("Cannot {verb} plan {} while it is {}", plan.id, plan.status));
    }
    store.save_plan(&plan)?;
    println!("Plan {} is now {}", plan.id, plan.status);
    Ok(())
}

/// Execute the `start` command.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded or saved, or is not
/// draft or paused.
pub fn start(ctx: &ServiceContext, root: &Path, plan_id: Option<&str>) -> Result<(), String> {
    transition(ctx, root, plan_id, "start", |plan| {
        scheduler::start_execution(plan, ctx.clock.as_ref())
    })
}

/// Execute the `pause` command.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded or saved, or is not
/// active.
pub fn pause(ctx: &ServiceContext, root: &Path, plan_id: Option<&str>) -> Result<(), String> {
    transition(ctx, root, plan_id, "pause", scheduler::pause_execution)
}

/// Execute the `resume` command.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded or saved, or is not
/// paused.
pub fn resume(ctx: &ServiceContext, root: &Path, plan_id: Option<&str>) -> Result<(), String> {
    transition(ctx, root, plan_id, "resume", scheduler::resume_execution)
}

/// Execute the `cancel` command.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded or saved, or is
/// already completed or cancelled.
pub fn cancel(ctx: &ServiceContext, root: &Path, plan_id: Option<&str>) -> Result<(), String> {
    transition(ctx, root, plan_id, "cancel", scheduler::cancel_execution)
}

/// Execute the `update` command.
///
/// Completing a task also lifts blocks on dependents that are now clear.
///
/// # Errors
///
/// Returns an error string if the status is unknown, the task is not part of
/// the plan, or the plan cannot be loaded or saved.
pub fn update(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    task_id: &str,
    status: &str,
) -> Result<(), String> {
    let status: TaskStatus = status.parse()?;
    let store = PlanStore::new(ctx, root);
    let mut plan = load_plan(&store, plan_id)?;
    let plan_key = plan.id.clone();
    let not_found = || format!("Task not found in plan {plan_key}: {task_id}");

    if status == TaskStatus::Completed {
        let mut manager = store.load_blocks(&plan.id)?;
        let Some(completion) =
            coordinator::complete_in_plan(&mut plan, &mut manager, task_id, ctx.clock.as_ref())
        else {
            return Err(not_found());
        };
        store.save_blocks(&plan.id, &manager)?;
        if !completion.ready.is_empty() {
            println!("Now ready: {}", completion.ready.join(", "));
        }
    } else {
        let update = TaskProgressUpdate { task_id: task_id.to_string(), status };
        if !scheduler::update_task_progress(&mut plan, &update, ctx.clock.as_ref()) {
            return Err(not_found());
        }
    }

    store.save_plan(&plan)?;
    println!("{task_id} is now {status}");
    Ok(())
}
