//! Operator block commands: `block`, `hold`, `release`.

use std::path::Path;

use super::load_plan;
use crate::blocking::{BlockReason, BlockingManager};
use crate::context::ServiceContext;
use crate::coordinator;
use crate::plan::ExecutionPlan;
use crate::store::PlanStore;

/// Loads the plan and its block state, runs `apply`, and saves both.
fn with_blocks<T>(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    task_id: &str,
    apply: impl FnOnce(&mut ExecutionPlan, &mut BlockingManager) -> Option<T>,
) -> Result<T, String> {
    let store = PlanStore::new(ctx, root);
    let mut plan = load_plan(&store, plan_id)?;
    let mut manager = store.load_blocks(&plan.id)?;
    let Some(value) = apply(&mut plan, &mut manager) else {
        return Err(format!("Task not found in plan {}: {task_id}", plan.id));
    };
    store.save_blocks(&plan.id, &manager)?;
    store.save_plan(&plan)?;
    Ok(value)
}

/// Execute the `block` command.
///
/// # Errors
///
/// Returns an error string if the task is not part of the plan or the plan
/// cannot be loaded or saved.
pub fn block(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    task_id: &str,
    reason: Option<&str>,
) -> Result<(), String> {
    let reason = reason.map(BlockReason::from);
    let outcome = with_blocks(ctx, root, plan_id, task_id, |plan, manager| {
        coordinator::block_in_plan(plan, manager, task_id, reason, ctx.clock.as_ref())
    })?;
    println!(
        "Blocked {} task(s); {} already blocked",
        outcome.newly_blocked.len(),
        outcome.already_blocked.len()
    );
    for id in &outcome.newly_blocked {
        println!("  {id}");
    }
    Ok(())
}

/// Execute the `hold` command.
///
/// # Errors
///
/// Returns an error string if the task is not part of the plan or already
/// held, or the plan cannot be loaded or saved.
pub fn hold(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    task_id: &str,
) -> Result<(), String> {
    let placed = with_blocks(ctx, root, plan_id, task_id, |plan, manager| {
        plan.task(task_id)?;
        Some(coordinator::hold_in_plan(plan, manager, task_id, ctx.clock.as_ref()))
    })?;
    if !placed {
        return Err(format!("{task_id} is already on hold"));
    }
    println!("Placed manual hold on {task_id}");
    Ok(())
}

/// Execute the `release` command.
///
/// # Errors
///
/// Returns an error string if the task is not part of the plan or the plan
/// cannot be loaded or saved.
pub fn release(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    task_id: &str,
) -> Result<(), String> {
    let release = with_blocks(ctx, root, plan_id, task_id, |plan, manager| {
        coordinator::release_in_plan(plan, manager, task_id)
    })?;
    if !release.hold_removed {
        println!("{task_id} had no manual hold");
    }
    if release.still_blocked {
        println!("{task_id} is still blocked by an upstream failure");
    } else {
        println!("{task_id} is no longer blocked");
    }
    Ok(())
}
