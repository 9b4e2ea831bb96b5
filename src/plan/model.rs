//! Project plan input types.
//!
//! These mirror the YAML a planner produces: features with acceptance
//! criteria, links between features, user and developer stories, and success
//! criteria. They are read-only input to the execution plan builder.

use serde::{Deserialize, Serialize};

/// Business priority of a feature or story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeaturePriority {
    /// Must ship first.
    Critical,
    /// Important.
    High,
    /// Normal.
    #[default]
    Medium,
    /// Nice to have.
    Low,
}

impl FeaturePriority {
    /// Scheduling rank, 1 being the highest.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 1,
            Self::High => 2,
            Self::Medium => 3,
            Self::Low => 4,
        }
    }
}

/// A feature in the project plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Unique feature identifier.
    pub id: String,
    /// Short feature name.
    pub name: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Business priority.
    #[serde(default)]
    pub priority: FeaturePriority,
    /// What must be true when the feature is done.
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// Free-text labels.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Kind of relationship between two features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    /// The source feature cannot start until the target is done.
    Requires,
    /// Informational only; creates no dependency.
    RelatesTo,
}

/// A directed link between two features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLink {
    /// Feature the link starts from.
    pub source: String,
    /// Feature the link points to.
    pub target: String,
    /// Relationship kind.
    pub kind: LinkKind,
}

/// A user-facing story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    /// Unique story identifier.
    pub id: String,
    /// Story title.
    pub title: String,
    /// Story narrative.
    #[serde(default)]
    pub description: String,
    /// Feature this story belongs to.
    #[serde(default)]
    pub feature: Option<String>,
    /// Business priority.
    #[serde(default)]
    pub priority: FeaturePriority,
}

/// An implementation-level story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeveloperStory {
    /// Unique story identifier.
    pub id: String,
    /// Story title.
    pub title: String,
    /// Technical description.
    #[serde(default)]
    pub description: String,
    /// Feature this story implements.
    #[serde(default)]
    pub feature: Option<String>,
    /// Estimated effort in hours.
    #[serde(default)]
    pub estimated_hours: Option<f64>,
}

/// A project-level success criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessCriterion {
    /// Unique criterion identifier.
    pub id: String,
    /// What success looks like.
    pub description: String,
    /// Feature this criterion measures.
    #[serde(default)]
    pub feature: Option<String>,
}

/// The complete project plan submitted for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPlan {
    /// Project name.
    pub name: String,
    /// Features, in planner order.
    #[serde(default)]
    pub features: Vec<Feature>,
    /// Links between features.
    #[serde(default)]
    pub links: Vec<FeatureLink>,
    /// User stories.
    #[serde(default)]
    pub user_stories: Vec<UserStory>,
    /// Developer stories.
    #[serde(default)]
    pub developer_stories: Vec<DeveloperStory>,
    /// Success criteria.
    #[serde(default)]
    pub success_criteria: Vec<SuccessCriterion>,
}
