//! Command dispatch and handlers.

pub mod blocks;
pub mod handback;
pub mod lifecycle;
pub mod query;
pub mod submit;

use std::path::Path;

use serde::Serialize;

use crate::cli::Command;
use crate::config::store_root;
use crate::context::ServiceContext;
use crate::plan::ExecutionPlan;
use crate::store::PlanStore;

/// Dispatch a parsed command to its handler using live adapters and the
/// store named by `CONDUCTOR_STORE`.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let ctx = ServiceContext::live();
    dispatch_with_context(command, &ctx, &store_root())
}

/// Dispatch a command with the given service context and store root.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    root: &Path,
) -> Result<(), String> {
    match command {
        Command::Submit { file, no_criteria, no_stories, start } => {
            let overrides = submit::Overrides {
                no_criteria: *no_criteria,
                no_stories: *no_stories,
                start: *start,
            };
            submit::run_with_context(ctx, root, file, overrides)
        }
        Command::Order { plan } => query::order(ctx, root, plan.id.as_deref()),
        Command::Next { plan, limit, json } => {
            query::next(ctx, root, plan.id.as_deref(), *limit, *json)
        }
        Command::Status { plan, json } => query::status(ctx, root, plan.id.as_deref(), *json),
        Command::Blocked { plan, json } => query::blocked(ctx, root, plan.id.as_deref(), *json),
        Command::Why { task, plan, json } => {
            query::why(ctx, root, plan.id.as_deref(), task, *json)
        }
        Command::Start { plan } => lifecycle::start(ctx, root, plan.id.as_deref()),
        Command::Pause { plan } => lifecycle::pause(ctx, root, plan.id.as_deref()),
        Command::Resume { plan } => lifecycle::resume(ctx, root, plan.id.as_deref()),
        Command::Cancel { plan } => lifecycle::cancel(ctx, root, plan.id.as_deref()),
        Command::Update { task, status, plan } => {
            lifecycle::update(ctx, root, plan.id.as_deref(), task, status)
        }
        Command::Block { task, reason, plan } => {
            blocks::block(ctx, root, plan.id.as_deref(), task, reason.as_deref())
        }
        Command::Hold { task, plan } => blocks::hold(ctx, root, plan.id.as_deref(), task),
        Command::Release { task, plan } => blocks::release(ctx, root, plan.id.as_deref(), task),
        Command::Handback { order, outcome, plan, json } => {
            handback::run_with_context(ctx, root, plan.id.as_deref(), order, outcome, *json)
        }
    }
}

/// Loads the plan a command targets.
fn load_plan(store: &PlanStore<'_>, plan_id: Option<&str>) -> Result<ExecutionPlan, String> {
    let id = store.resolve_plan_id(plan_id)?;
    store.load_plan(&id)
}

/// Reads a text file through the filesystem port.
fn read_input(ctx: &ServiceContext, path: &Path, what: &str) -> Result<String, String> {
    ctx.fs
        .read_to_string(path)
        .map_err(|e| format!("Failed to read {what} {}: {e}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}
