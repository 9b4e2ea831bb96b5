//! Execution plans: building them from project plans and driving them.

pub mod builder;
pub mod estimate;
pub mod model;
pub mod scheduler;
pub mod task;

pub use builder::{compute_execution_order, submit_plan, PlanConfig, SubmitResult};
pub use model::{
    DeveloperStory, Feature, FeatureLink, FeaturePriority, LinkKind, ProjectPlan,
    SuccessCriterion, UserStory,
};
pub use scheduler::{BlockedTask, PlanProgress, TaskProgressUpdate};
pub use task::{ExecutionPlan, ExecutionTask, PlanStatus, SourceType, TaskStatus};
