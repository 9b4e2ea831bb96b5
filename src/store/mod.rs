//! Plan store: persistence for execution plans, block state, and validation
//! results.
//!
//! Uses the `FileSystem` port for all I/O. Directory layout:
//!
//! ```text
//! <root>/
//!   ├── config.yaml
//!   ├── plans/<plan-id>.yaml
//!   ├── blocks/<plan-id>.yaml
//!   └── validations/<plan-id>/<task-id>.yaml
//! ```

use std::path::{Path, PathBuf};

use crate::blocking::BlockingManager;
use crate::context::ServiceContext;
use crate::handback::{self, ValidationResult};
use crate::plan::ExecutionPlan;

/// Persistence layer for plans and their runtime state.
pub struct PlanStore<'a> {
    ctx: &'a ServiceContext,
    root: PathBuf,
}

impl<'a> PlanStore<'a> {
    /// Creates a store rooted at the given path.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, root: &Path) -> Self {
        Self { ctx, root: root.to_path_buf() }
    }

    /// The store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saves a plan to `<root>/plans/<id>.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save_plan(&self, plan: &ExecutionPlan) -> Result<(), String> {
        let yaml = serde_yaml::to_string(plan)
            .map_err(|e| format!("Failed to serialize plan {}: {e}", plan.id))?;
        self.ctx
            .fs
            .write(&self.plan_path(&plan.id), &yaml)
            .map_err(|e| format!("Failed to write plan {}: {e}", plan.id))
    }

    /// Loads a plan by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan does not exist or cannot be parsed.
    pub fn load_plan(&self, id: &str) -> Result<ExecutionPlan, String> {
        let path = self.plan_path(id);
        if !self.ctx.fs.exists(&path) {
            return Err(format!("Plan not found: {id}"));
        }
        let contents = self
            .ctx
            .fs
            .read_to_string(&path)
            .map_err(|e| format!("Failed to read plan {id}: {e}"))?;
        serde_yaml::from_str(&contents).map_err(|e| format!("Failed to parse plan {id}: {e}"))
    }

    /// Lists plan IDs, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the plans directory cannot be listed.
    pub fn list_plans(&self) -> Result<Vec<String>, String> {
        let dir = self.root.join("plans");
        if !self.ctx.fs.exists(&dir) {
            return Ok(Vec::new());
        }
        let entries =
            self.ctx.fs.list_dir(&dir).map_err(|e| format!("Failed to list plans directory: {e}"))?;
        let mut ids: Vec<String> = entries
            .into_iter()
            .filter_map(|name| name.strip_suffix(".yaml").map(String::from))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Resolves which plan a command targets.
    ///
    /// An explicit ID wins; otherwise the store must hold exactly one plan.
    ///
    /// # Errors
    ///
    /// Returns an error if no plan is stored, or several are and none was
    /// named.
    pub fn resolve_plan_id(&self, explicit: Option<&str>) -> Result<String, String> {
        if let Some(id) = explicit {
            return Ok(id.to_string());
        }
        let mut ids = self.list_plans()?;
        match ids.len() {
            0 => Err("No plans found. Submit one with `conductor submit <FILE>`".to_string()),
            1 => Ok(ids.remove(0)),
            _ => Err(format!("Several plans found ({}); pick one with --plan", ids.join(", "))),
        }
    }

    /// Saves the block state for a plan.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save_blocks(&self, plan_id: &str, manager: &BlockingManager) -> Result<(), String> {
        let yaml = serde_yaml::to_string(manager)
            .map_err(|e| format!("Failed to serialize block state for {plan_id}: {e}"))?;
        self.ctx
            .fs
            .write(&self.blocks_path(plan_id), &yaml)
            .map_err(|e| format!("Failed to write block state for {plan_id}: {e}"))
    }

    /// Loads the block state for a plan. A plan that never had anything
    /// blocked gets an empty manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_blocks(&self, plan_id: &str) -> Result<BlockingManager, String> {
        let path = self.blocks_path(plan_id);
        if !self.ctx.fs.exists(&path) {
            return Ok(BlockingManager::new());
        }
        let contents = self
            .ctx
            .fs
            .read_to_string(&path)
            .map_err(|e| format!("Failed to read block state for {plan_id}: {e}"))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse block state for {plan_id}: {e}"))
    }

    /// Records a validation result under its plan.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or file writing fails.
    pub fn save_validation(&self, plan_id: &str, result: &ValidationResult) -> Result<(), String> {
        let yaml = handback::encode(result).map_err(|e| e.to_string())?;
        self.ctx
            .fs
            .write(&self.validation_path(plan_id, &result.task_id), &yaml)
            .map_err(|e| format!("Failed to write validation for {}: {e}", result.task_id))
    }

    /// Loads the last validation result recorded for a task, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn load_validation(
        &self,
        plan_id: &str,
        task_id: &str,
    ) -> Result<Option<ValidationResult>, String> {
        let path = self.validation_path(plan_id, task_id);
        if !self.ctx.fs.exists(&path) {
            return Ok(None);
        }
        let contents = self
            .ctx
            .fs
            .read_to_string(&path)
            .map_err(|e| format!("Failed to read validation for {task_id}: {e}"))?;
        handback::decode(&contents).map(Some).map_err(|e| e.to_string())
    }

    fn plan_path(&self, id: &str) -> PathBuf {
        self.root.join("plans").join(format!("{id}.yaml"))
    }

    fn blocks_path(&self, plan_id: &str) -> PathBuf {
        self.root.join("blocks").join(format!("{plan_id}.yaml"))
    }

    fn validation_path(&self, plan_id: &str, task_id: &str) -> PathBuf {
        self.root.join("validations").join(plan_id).join(format!("{task_id}.yaml"))
    }
}
