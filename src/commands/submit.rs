//! `conductor submit` command.

use std::path::Path;

use tracing::warn;

use super::read_input;
use crate::blocking::BlockingManager;
use crate::config::load_config;
use crate::context::ServiceContext;
use crate::plan::{submit_plan, ProjectPlan};
use crate::store::PlanStore;

/// Command-line switches that override the stored plan config.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    /// Skip criterion tasks.
    pub no_criteria: bool,
    /// Skip story tasks.
    pub no_stories: bool,
    /// Start execution right away.
    pub start: bool,
}

/// Execute the `submit` command.
///
/// Reads the project plan, builds the execution plan, and stores it with an
/// empty block state. Warnings go to stderr.
///
/// # Errors
///
/// Returns an error string if the file cannot be read or parsed, if the
/// plan is rejected, or if it cannot be stored.
pub fn run_with_context(
    ctx: &ServiceContext,
    root: &Path,
    file: &Path,
    overrides: Overrides,
) -> Result<(), String> {
    let mut config = load_config(ctx.fs.as_ref(), root)?.plan;
    if overrides.no_criteria {
        config.include_criteria = false;
    }
    if overrides.no_stories {
        config.include_stories = false;
    }
    if overrides.start {
        config.auto_start = true;
    }

    let contents = read_input(ctx, file, "project plan")?;
    let project: ProjectPlan = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse project plan {}: {e}", file.display()))?;

    let result = submit_plan(ctx, &project, &config);
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
    let Some(plan) = result.plan.filter(|_| result.success) else {
        warn!(project = %project.name, "plan rejected");
        return Err(format!("Plan rejected:\n  {}", result.errors.join("\n  ")));
    };

    let store = PlanStore::new(ctx, root);
    store.save_plan(&plan)?;
    store.save_blocks(&plan.id, &BlockingManager::new())?;

    println!("Created plan {} ({}) with {} tasks", plan.id, plan.status, plan.tasks.len());
    println!("Execution order:");
    for (i, id) in plan.execution_order.iter().enumerate() {
        println!("  {}. {id}", i + 1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{ctx, root, submitted};
    use crate::plan::{PlanStatus, TaskStatus};

    #[test]
    fn submit_stores_started_plan() {
        let ctx = ctx();
        submitted(&ctx);

        let store = PlanStore::new(&ctx, &root());
        let plan = store.load_plan("plan-001").unwrap();
        assert_eq!(plan.status, PlanStatus::Active);
        assert_eq!(plan.execution_order, vec!["task-catalog", "task-cart", "task-checkout"]);
        assert_eq!(plan.task("task-catalog").unwrap().status, TaskStatus::Ready);
        assert_eq!(store.load_blocks("plan-001").unwrap(), BlockingManager::new());
    }

    #[test]
    fn submit_without_start_leaves_draft() {
        let ctx = ctx();
        ctx.fs.write(Path::new("/in/p.yaml"), crate::commands::testing::PROJECT).unwrap();

        run_with_context(&ctx, &root(), Path::new("/in/p.yaml"), Overrides::default()).unwrap();

        let plan = PlanStore::new(&ctx, &root()).load_plan("plan-001").unwrap();
        assert_eq!(plan.status, PlanStatus::Draft);
    }

    #[test]
    fn empty_project_is_rejected() {
        let ctx = ctx();
        ctx.fs.write(Path::new("/in/empty.yaml"), "name: Nothing\n").unwrap();

        let err = run_with_context(&ctx, &root(), Path::new("/in/empty.yaml"), Overrides::default())
            .unwrap_err();

        assert!(err.starts_with("Plan rejected"), "{err}");
        assert!(PlanStore::new(&ctx, &root()).list_plans().unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_reported() {
        let ctx = ctx();
        let err = run_with_context(&ctx, &root(), Path::new("/in/nope.yaml"), Overrides::default())
            .unwrap_err();
        assert!(err.starts_with("Failed to read project plan"), "{err}");
    }
}
