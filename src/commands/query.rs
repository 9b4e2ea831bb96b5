//! Read-only plan projections: `order`, `next`, `status`, `blocked`, `why`.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{load_plan, print_json};
use crate::context::ServiceContext;
use crate::plan::scheduler;
use crate::store::PlanStore;

/// Execute the `order` command.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded.
pub fn order(ctx: &ServiceContext, root: &Path, plan_id: Option<&str>) -> Result<(), String> {
    let plan = load_plan(&PlanStore::new(ctx, root), plan_id)?;
    for (i, id) in plan.execution_order.iter().enumerate() {
        let title = plan.task(id).map_or("", |t| t.title.as_str());
        println!("{:>3}. {id}  {title}", i + 1);
    }
    let unordered = plan.tasks.len() - plan.execution_order.len();
    if unordered > 0 {
        println!("({unordered} task(s) excluded by circular dependencies)");
    }
    Ok(())
}

/// Execute the `next` command.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded.
pub fn next(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    limit: usize,
    json: bool,
) -> Result<(), String> {
    let plan = load_plan(&PlanStore::new(ctx, root), plan_id)?;
    let tasks = scheduler::next_tasks(&plan, limit);
    if json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("No tasks are ready.");
        return Ok(());
    }
    for task in tasks {
        println!("[P{}] {}  {}", task.priority, task.id, task.title);
    }
    Ok(())
}

/// Execute the `status` command.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded.
pub fn status(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let plan = load_plan(&PlanStore::new(ctx, root), plan_id)?;
    let progress = scheduler::calculate_progress(&plan);
    if json {
        return print_json(&progress);
    }

    println!("Plan {} ({}): {}", plan.id, plan.name, plan.status);
    println!("Progress: {}% ({}/{} completed)", progress.percentage, progress.completed, progress.total);
    println!(
        "Tasks: {} pending, {} ready, {} in progress, {} blocked, {} cancelled",
        progress.pending, progress.ready, progress.in_progress, progress.blocked, progress.cancelled
    );
    println!("Estimated remaining: {:.1}h", progress.estimated_remaining_hours);
    Ok(())
}

/// Execute the `blocked` command.
///
/// # Errors
///
/// Returns an error string if the plan or its block state cannot be loaded.
pub fn blocked(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let plan = load_plan(&PlanStore::new(ctx, root), plan_id)?;
    let waiting = scheduler::blocked_tasks(&plan);
    if json {
        return print_json(&waiting);
    }
    if waiting.is_empty() {
        println!("Nothing is waiting.");
        return Ok(());
    }
    for task in &waiting {
        println!("{} [{}] waiting on {}", task.task_id, task.status, task.waiting_on.join(", "));
    }
    Ok(())
}

/// Why a task cannot run.
#[derive(Debug, Serialize)]
struct WhyReport {
    task_id: String,
    blocked: bool,
    held: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked_at: Option<DateTime<Utc>>,
    chain: Vec<String>,
    blast_radius: usize,
}

/// Execute the `why` command.
///
/// # Errors
///
/// Returns an error string if the plan or its block state cannot be loaded,
/// or the task is not part of the plan.
pub fn why(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    task_id: &str,
    json: bool,
) -> Result<(), String> {
    let store = PlanStore::new(ctx, root);
    let plan = load_plan(&store, plan_id)?;
    if plan.task(task_id).is_none() {
        return Err(format!("Task not found in plan {}: {task_id}", plan.id));
    }
    let manager = store.load_blocks(&plan.id)?;
    let graph = scheduler::dependency_graph(&plan);
    let record = manager.block_info(task_id);

    let report = WhyReport {
        task_id: task_id.to_string(),
        blocked: manager.is_blocked(task_id),
        held: manager.is_held(task_id),
        reason: record.map(|r| r.reason.to_string()),
        source: record.and_then(|r| r.source.clone()),
        blocked_at: record.map(|r| r.blocked_at),
        chain: manager.blocking_chain(task_id, &graph),
        blast_radius: crate::blocking::calculate_blast_radius(task_id, &graph),
    };
    if json {
        return print_json(&report);
    }

    if report.blocked {
        let reason = report.reason.as_deref().unwrap_or("manual-hold");
        println!("{task_id} is blocked: {reason}");
        if let Some(source) = &report.source {
            println!("  cascaded from {source}");
        }
        if report.held {
            println!("  manual hold in place");
        }
    } else {
        println!("{task_id} is not blocked.");
    }
    if !report.chain.is_empty() {
        println!("Blocked upstream: {}", report.chain.join(" <- "));
    }
    println!("Blocking it would freeze {} downstream task(s).", report.blast_radius);
    Ok(())
}
