//! `conductor handback` command.

use std::path::Path;

use super::{load_plan, print_json, read_input};
use crate::config::load_config;
use crate::context::ServiceContext;
use crate::coordinator;
use crate::handback::{self, CheckStatus, OutcomeReport, ValidationResult, WorkOrder};
use crate::store::PlanStore;

/// Execute the `handback` command.
///
/// Validates the outcome report against its work order, records the result
/// under the plan, and applies the suggested status.
///
/// # Errors
///
/// Returns an error string if either file cannot be read or decoded, the
/// two refer to different tasks, the task is not part of the plan, or the
/// store cannot be updated.
pub fn run_with_context(
    ctx: &ServiceContext,
    root: &Path,
    plan_id: Option<&str>,
    order_path: &Path,
    outcome_path: &Path,
    json: bool,
) -> Result<(), String> {
    let order: WorkOrder =
        handback::decode(&read_input(ctx, order_path, "work order")?).map_err(|e| e.to_string())?;
    let outcome: OutcomeReport = handback::decode(&read_input(ctx, outcome_path, "outcome report")?)
        .map_err(|e| e.to_string())?;
    if order.task_id != outcome.task_id {
        return Err(format!(
            "Outcome report is for {} but the work order is for {}",
            outcome.task_id, order.task_id
        ));
    }

    let config = load_config(ctx.fs.as_ref(), root)?;
    let store = PlanStore::new(ctx, root);
    let mut plan = load_plan(&store, plan_id)?;
    let mut manager = store.load_blocks(&plan.id)?;

    let result = handback::validate_handback(&order, &outcome, &config.handback);
    let Some(applied) =
        coordinator::apply_validation(&mut plan, &mut manager, &result, ctx.clock.as_ref())
    else {
        return Err(format!("Task not found in plan {}: {}", plan.id, order.task_id));
    };

    store.save_validation(&plan.id, &result)?;
    store.save_blocks(&plan.id, &manager)?;
    store.save_plan(&plan)?;

    if json {
        return print_json(&result);
    }
    print_result(&result);
    if !applied.blocked.is_empty() {
        println!("Blocked: {}", applied.blocked.join(", "));
    }
    if !applied.unblocked.is_empty() {
        println!("Unblocked: {}", applied.unblocked.join(", "));
    }
    if !applied.ready.is_empty() {
        println!("Now ready: {}", applied.ready.join(", "));
    }
    Ok(())
}

fn print_result(result: &ValidationResult) {
    println!("{}: {}", result.task_id, result.summary);
    for check in &result.checks {
        let mark = match check.result {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skip => "SKIP",
            CheckStatus::Warning => "WARN",
        };
        println!("  [{mark}] {}: {}", check.name, check.details);
    }
    for violation in &result.scope_violations {
        println!("  scope: {} ({})", violation.path, violation.reason);
    }
    println!(
        "Criteria matched: {}/{}; next status: {}",
        result.criteria_matched, result.criteria_total, result.suggested_status
    );
}
