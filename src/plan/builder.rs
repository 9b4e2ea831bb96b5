//! Turns a project plan into an execution plan.
//!
//! Synthesizes one task per relevant plan entity, derives the dependency map,
//! surfaces dangling references and cycles as warnings, and computes the
//! execution order with a priority-aware Kahn's algorithm.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::estimate::estimate_feature_hours;
use super::model::{FeaturePriority, LinkKind, ProjectPlan};
use super::scheduler;
use super::task::{ExecutionPlan, ExecutionTask, PlanStatus, SourceType, TaskStatus};
use crate::context::ServiceContext;
use crate::graph::DependencyGraph;

/// Options controlling which tasks are synthesized and whether execution
/// starts immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Create one task per acceptance and success criterion.
    pub include_criteria: bool,
    /// Create one task per user and developer story.
    pub include_stories: bool,
    /// Activate the plan and compute the ready set on submission.
    pub auto_start: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self { include_criteria: true, include_stories: true, auto_start: false }
    }
}

/// Outcome of [`submit_plan`]. Always returned, even on failure.
#[derive(Debug, Clone)]
pub struct SubmitResult {
    /// Whether an execution plan was produced.
    pub success: bool,
    /// The execution plan, when `success` is true.
    pub plan: Option<ExecutionPlan>,
    /// Structural problems that did not prevent plan creation.
    pub warnings: Vec<String>,
    /// Problems that prevented plan creation.
    pub errors: Vec<String>,
}

/// Task ID for a feature.
#[must_use]
pub fn feature_task_id(feature_id: &str) -> String {
    format!("task-{feature_id}")
}

/// Builds an execution plan from a project plan.
///
/// Dangling dependency references and cycles are reported as warnings; the
/// dangling reference is dropped, and cycle members simply never appear in
/// the execution order. An empty plan or duplicate task IDs fail the
/// submission.
#[must_use]
pub fn submit_plan(ctx: &ServiceContext, project: &ProjectPlan, config: &PlanConfig) -> SubmitResult {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    if project.features.is_empty() {
        errors.push(format!("Plan '{}' has no features to execute", project.name));
        return SubmitResult { success: false, plan: None, warnings, errors };
    }

    let mut tasks = synthesize_tasks(project, config);

    let mut seen = HashSet::new();
    for task in &tasks {
        if !seen.insert(task.id.as_str()) {
            errors.push(format!("Duplicate task id '{}'", task.id));
        }
    }
    if !errors.is_empty() {
        return SubmitResult { success: false, plan: None, warnings, errors };
    }

    let mut dependencies = build_dependency_map(project, &tasks, &mut warnings);
    prune_dangling(&mut dependencies, &mut warnings);
    for task in &mut tasks {
        task.dependencies = dependencies.get(&task.id).cloned().unwrap_or_default();
    }

    if let Some(cycle) = detect_cycle(&dependencies) {
        warnings.push(format!("Circular dependency detected: {}", cycle.join(" -> ")));
    }

    let execution_order = compute_execution_order(&tasks, &dependencies);
    let unordered = tasks.len() - execution_order.len();
    if unordered > 0 {
        warnings.push(format!("{unordered} task(s) are unreachable because of circular dependencies"));
    }

    let mut plan = ExecutionPlan {
        id: ctx.id_gen.generate_id(),
        name: project.name.clone(),
        tasks,
        dependencies,
        execution_order,
        status: PlanStatus::Draft,
        created_at: ctx.clock.now(),
        started_at: None,
        completed_at: None,
    };

    if config.auto_start {
        scheduler::start_execution(&mut plan, ctx.clock.as_ref());
    }

    for warning in &warnings {
        warn!(plan = %plan.id, "{warning}");
    }
    info!(plan = %plan.id, tasks = plan.tasks.len(), warnings = warnings.len(), "plan submitted");

    SubmitResult { success: true, plan: Some(plan), warnings, errors }
}

fn synthesize_tasks(project: &ProjectPlan, config: &PlanConfig) -> Vec<ExecutionTask> {
    let feature_ranks: HashMap<&str, u8> =
        project.features.iter().map(|f| (f.id.as_str(), f.priority.rank())).collect();
    let owning_feature = |feature: Option<&String>| {
        feature.filter(|id| feature_ranks.contains_key(id.as_str())).map(|id| {
            let rank = feature_ranks[id.as_str()];
            (feature_task_id(id), rank)
        })
    };

    let mut tasks = Vec::new();

    for feature in &project.features {
        let parent_id = feature_task_id(&feature.id);
        let mut tags: BTreeSet<String> = feature.tags.iter().cloned().collect();
        tags.insert("feature".to_string());
        tasks.push(ExecutionTask {
            id: parent_id.clone(),
            source_type: SourceType::Feature,
            source_id: feature.id.clone(),
            title: feature.name.clone(),
            description: feature.description.clone(),
            priority: feature.priority.rank(),
            dependencies: Vec::new(),
            tags,
            estimated_hours: Some(f64::from(estimate_feature_hours(feature))),
            status: TaskStatus::Pending,
        });

        if config.include_criteria {
            for (index, criterion) in feature.acceptance_criteria.iter().enumerate() {
                let n = index + 1;
                tasks.push(ExecutionTask {
                    id: format!("{parent_id}-ac-{n}"),
                    source_type: SourceType::Criterion,
                    source_id: format!("{}#ac-{n}", feature.id),
                    title: criterion.clone(),
                    description: format!("Acceptance criterion {n} of {}", feature.name),
                    priority: feature.priority.rank(),
                    dependencies: vec![parent_id.clone()],
                    tags: BTreeSet::from(["criterion".to_string()]),
                    estimated_hours: None,
                    status: TaskStatus::Pending,
                });
            }
        }
    }

    if config.include_criteria {
        for criterion in &project.success_criteria {
            let owner = owning_feature(criterion.feature.as_ref());
            tasks.push(ExecutionTask {
                id: format!("task-sc-{}", criterion.id),
                source_type: SourceType::Criterion,
                source_id: criterion.id.clone(),
                title: criterion.description.clone(),
                description: String::new(),
                priority: owner.as_ref().map_or(FeaturePriority::Medium.rank(), |(_, rank)| *rank),
                dependencies: owner.into_iter().map(|(id, _)| id).collect(),
                tags: BTreeSet::from(["success-criterion".to_string()]),
                estimated_hours: None,
                status: TaskStatus::Pending,
            });
        }
    }

    if config.include_stories {
        for story in &project.user_stories {
            tasks.push(ExecutionTask {
                id: format!("task-us-{}", story.id),
                source_type: SourceType::UserStory,
                source_id: story.id.clone(),
                title: story.title.clone(),
                description: story.description.clone(),
                priority: story.priority.rank(),
                dependencies: Vec::new(),
                tags: BTreeSet::from(["user-story".to_string()]),
                estimated_hours: None,
                status: TaskStatus::Pending,
            });
        }
        for story in &project.developer_stories {
            let owner = owning_feature(story.feature.as_ref());
            tasks.push(ExecutionTask {
                id: format!("task-ds-{}", story.id),
                source_type: SourceType::DeveloperStory,
                source_id: story.id.clone(),
                title: story.title.clone(),
                description: story.description.clone(),
                priority: owner.as_ref().map_or(FeaturePriority::Medium.rank(), |(_, rank)| *rank),
                dependencies: owner.into_iter().map(|(id, _)| id).collect(),
                tags: BTreeSet::from(["developer-story".to_string()]),
                estimated_hours: story.estimated_hours,
                status: TaskStatus::Pending,
            });
        }
    }

    tasks
}

/// Unions creation-time dependencies with `requires` links, deduplicated
/// and in first-seen order.
fn build_dependency_map(
    project: &ProjectPlan,
    tasks: &[ExecutionTask],
    warnings: &mut Vec<String>,
) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> =
        tasks.iter().map(|t| (t.id.clone(), t.dependencies.clone())).collect();

    for link in project.links.iter().filter(|l| l.kind == LinkKind::Requires) {
        let dependent = feature_task_id(&link.source);
        let dependency = feature_task_id(&link.target);
        match map.get_mut(&dependent) {
            Some(deps) => {
                if !deps.contains(&dependency) {
                    deps.push(dependency);
                }
            }
            None => warnings.push(format!(
                "Link from unknown feature '{}' to '{}' was ignored",
                link.source, link.target
            )),
        }
    }

    map
}

fn prune_dangling(map: &mut BTreeMap<String, Vec<String>>, warnings: &mut Vec<String>) {
    let known: HashSet<String> = map.keys().cloned().collect();
    for (task_id, deps) in map.iter_mut() {
        deps.retain(|dep| {
            let exists = known.contains(dep);
            if !exists {
                warnings.push(format!("Task '{task_id}' depends on unknown task '{dep}'"));
            }
            exists
        });
    }
}

fn detect_cycle(map: &BTreeMap<String, Vec<String>>) -> Option<Vec<String>> {
    let mut graph = DependencyGraph::new();
    for (task_id, deps) in map {
        graph.add_node(task_id);
        for dep in deps {
            graph.add_dependency(task_id, dep);
        }
    }
    graph.find_cycle()
}

/// Kahn's algorithm with a priority tie-break.
///
/// The ready queue is stably re-sorted by ascending priority before every
/// extraction, so among simultaneously eligible tasks the lowest priority
/// number goes first and equal priorities keep queue order. Tasks inside a
/// cycle never reach zero in-degree and are left out.
#[must_use]
pub fn compute_execution_order(
    tasks: &[ExecutionTask],
    dependencies: &BTreeMap<String, Vec<String>>,
) -> Vec<String> {
    let priority: HashMap<&str, u8> = tasks.iter().map(|t| (t.id.as_str(), t.priority)).collect();
    let mut in_degree: HashMap<&str, usize> = tasks.iter().map(|t| (t.id.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

    for task in tasks {
        let Some(deps) = dependencies.get(&task.id) else { continue };
        for dep in deps {
            if !priority.contains_key(dep.as_str()) {
                continue;
            }
            if let Some(degree) = in_degree.get_mut(task.id.as_str()) {
                *degree += 1;
            }
            adjacency.entry(dep.as_str()).or_default().push(task.id.as_str());
        }
    }

    let mut queue: Vec<&str> = tasks
        .iter()
        .map(|t| t.id.as_str())
        .filter(|id| in_degree.get(id).copied() == Some(0))
        .collect();
    let mut order = Vec::with_capacity(tasks.len());

    while !queue.is_empty() {
        queue.sort_by_key(|id| priority.get(id).copied().unwrap_or(u8::MAX));
        let next = queue.remove(0);
        order.push(next.to_string());

        for &dependent in adjacency.get(next).map(Vec::as_slice).unwrap_or_default() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push(dependent);
                }
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::model::{
        DeveloperStory, Feature, FeatureLink, SuccessCriterion, UserStory,
    };
    use chrono::{TimeZone, Utc};

    fn ctx() -> ServiceContext {
        ServiceContext::in_memory(Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap())
    }

    fn feature(id: &str, priority: FeaturePriority, criteria: &[&str]) -> Feature {
        Feature {
            id: id.into(),
            name: format!("Feature {id}"),
            description: String::new(),
            priority,
            acceptance_criteria: criteria.iter().map(|c| (*c).to_string()).collect(),
            tags: Vec::new(),
        }
    }

    fn requires(source: &str, target: &str) -> FeatureLink {
        FeatureLink { source: source.into(), target: target.into(), kind: LinkKind::Requires }
    }

    fn project(features: Vec<Feature>, links: Vec<FeatureLink>) -> ProjectPlan {
        ProjectPlan {
            name: "Demo".into(),
            features,
            links,
            user_stories: Vec::new(),
            developer_stories: Vec::new(),
            success_criteria: Vec::new(),
        }
    }

    fn features_only() -> PlanConfig {
        PlanConfig { include_criteria: false, include_stories: false, auto_start: false }
    }

    fn task(id: &str, priority: u8) -> ExecutionTask {
        ExecutionTask {
            id: id.into(),
            source_type: SourceType::Feature,
            source_id: id.into(),
            title: id.into(),
            description: String::new(),
            priority,
            dependencies: Vec::new(),
            tags: BTreeSet::new(),
            estimated_hours: None,
            status: TaskStatus::Pending,
        }
    }

    fn deps(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(id, ds)| ((*id).to_string(), ds.iter().map(|d| (*d).to_string()).collect()))
            .collect()
    }

    #[test]
    fn linear_chain_orders_dependencies_first() {
        let tasks = vec![task("C", 3), task("B", 3), task("A", 3)];
        let map = deps(&[("A", &[]), ("B", &["A"]), ("C", &["B"])]);
        assert_eq!(compute_execution_order(&tasks, &map), vec!["A", "B", "C"]);
    }

    #[test]
    fn lowest_priority_number_wins_ties() {
        let tasks = vec![task("low", 4), task("crit", 1), task("mid", 3)];
        let map = deps(&[("low", &[]), ("crit", &[]), ("mid", &[])]);
        assert_eq!(compute_execution_order(&tasks, &map), vec!["crit", "mid", "low"]);
    }

    #[test]
    fn newly_eligible_high_priority_task_jumps_queue() {
        // "urgent" depends on "first"; once "first" is done it should beat
        // the already-queued low-priority task.
        let tasks = vec![task("first", 2), task("later", 4), task("urgent", 1)];
        let map = deps(&[("first", &[]), ("later", &[]), ("urgent", &["first"])]);
        assert_eq!(compute_execution_order(&tasks, &map), vec!["first", "urgent", "later"]);
    }

    #[test]
    fn equal_priorities_keep_task_order() {
        let tasks = vec![task("x", 3), task("y", 3), task("z", 3)];
        let map = deps(&[("x", &[]), ("y", &[]), ("z", &[])]);
        assert_eq!(compute_execution_order(&tasks, &map), vec!["x", "y", "z"]);
    }

    /// Deterministic 64-bit LCG so generated graphs are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn below(&mut self, bound: u64) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (self.0 >> 33) % bound
        }
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn generated_dags_respect_edges_and_priorities() {
        for seed in 0..200_u64 {
            let mut rng = Lcg(seed);
            let n = 1 + rng.below(12) as usize;
            let ids: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();

            // Edges only point from a higher index to a lower one, so the
            // graph is acyclic; task order is shuffled independently.
            let mut map = BTreeMap::new();
            for (i, id) in ids.iter().enumerate() {
                let ds: Vec<String> =
                    (0..i).filter(|_| rng.below(3) == 0).map(|j| ids[j].clone()).collect();
                map.insert(id.clone(), ds);
            }
            let mut tasks: Vec<ExecutionTask> =
                ids.iter().map(|id| task(id, 1 + rng.below(4) as u8)).collect();
            for i in (1..tasks.len()).rev() {
                tasks.swap(i, rng.below(i as u64 + 1) as usize);
            }

            let order = compute_execution_order(&tasks, &map);

            assert_eq!(order.len(), n, "seed {seed}: every task of an acyclic plan is ordered");
            let position: HashMap<&str, usize> =
                order.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
            for (id, ds) in &map {
                for dep in ds {
                    assert!(
                        position[dep.as_str()] < position[id.as_str()],
                        "seed {seed}: {dep} before {id}"
                    );
                }
            }

            let priority: HashMap<&str, u8> =
                tasks.iter().map(|t| (t.id.as_str(), t.priority)).collect();
            let mut done: HashSet<&str> = HashSet::new();
            for picked in &order {
                let eligible_best = tasks
                    .iter()
                    .filter(|t| !done.contains(t.id.as_str()))
                    .filter(|t| map[&t.id].iter().all(|d| done.contains(d.as_str())))
                    .map(|t| t.priority)
                    .min();
                assert_eq!(
                    Some(priority[picked.as_str()]),
                    eligible_best,
                    "seed {seed}: {picked} is not the most urgent eligible task"
                );
                done.insert(picked.as_str());
            }
        }
    }

    #[test]
    fn cycle_members_are_left_out() {
        let tasks = vec![task("A", 3), task("B", 3), task("C", 3)];
        let map = deps(&[("A", &[]), ("B", &["C"]), ("C", &["B"])]);
        assert_eq!(compute_execution_order(&tasks, &map), vec!["A"]);
    }

    #[test]
    fn submit_builds_feature_tasks_from_links() {
        let project = project(
            vec![
                feature("api", FeaturePriority::Medium, &[]),
                feature("db", FeaturePriority::Medium, &[]),
            ],
            vec![requires("api", "db")],
        );

        let result = submit_plan(&ctx(), &project, &features_only());

        assert!(result.success);
        assert!(result.warnings.is_empty());
        let plan = result.plan.unwrap();
        assert_eq!(plan.id, "plan-001");
        assert_eq!(plan.status, PlanStatus::Draft);
        assert_eq!(plan.execution_order, vec!["task-db", "task-api"]);
        assert_eq!(plan.task("task-api").unwrap().dependencies, vec!["task-db"]);
        assert_eq!(plan.task("task-api").unwrap().estimated_hours, Some(4.0));
    }

    #[test]
    fn relates_to_links_create_no_dependency() {
        let mut links = vec![requires("a", "b")];
        links[0].kind = LinkKind::RelatesTo;
        let project = project(
            vec![feature("a", FeaturePriority::Medium, &[]), feature("b", FeaturePriority::Medium, &[])],
            links,
        );

        let plan = submit_plan(&ctx(), &project, &features_only()).plan.unwrap();
        assert!(plan.task("task-a").unwrap().dependencies.is_empty());
    }

    #[test]
    fn criteria_tasks_depend_on_their_feature() {
        let project = project(vec![feature("auth", FeaturePriority::High, &["Login works", "Logout works"])], vec![]);
        let config = PlanConfig { include_criteria: true, include_stories: false, auto_start: false };

        let plan = submit_plan(&ctx(), &project, &config).plan.unwrap();

        assert_eq!(plan.tasks.len(), 3);
        let ac = plan.task("task-auth-ac-2").unwrap();
        assert_eq!(ac.source_type, SourceType::Criterion);
        assert_eq!(ac.title, "Logout works");
        assert_eq!(ac.priority, 2);
        assert_eq!(ac.dependencies, vec!["task-auth"]);
        assert_eq!(plan.execution_order[0], "task-auth");
    }

    #[test]
    fn stories_and_success_criteria_resolve_owning_feature() {
        let mut project = project(vec![feature("core", FeaturePriority::Critical, &[])], vec![]);
        project.developer_stories = vec![
            DeveloperStory {
                id: "d1".into(),
                title: "Schema".into(),
                description: String::new(),
                feature: Some("core".into()),
                estimated_hours: Some(6.0),
            },
            DeveloperStory {
                id: "d2".into(),
                title: "Orphan".into(),
                description: String::new(),
                feature: Some("ghost".into()),
                estimated_hours: None,
            },
        ];
        project.user_stories = vec![UserStory {
            id: "u1".into(),
            title: "As a user".into(),
            description: String::new(),
            feature: Some("core".into()),
            priority: FeaturePriority::Low,
        }];
        project.success_criteria = vec![SuccessCriterion {
            id: "s1".into(),
            description: "p95 under 200ms".into(),
            feature: Some("core".into()),
        }];

        let result = submit_plan(&ctx(), &project, &PlanConfig::default());
        let plan = result.plan.unwrap();

        assert!(result.warnings.is_empty());
        let d1 = plan.task("task-ds-d1").unwrap();
        assert_eq!(d1.dependencies, vec!["task-core"]);
        assert_eq!(d1.priority, 1);
        assert_eq!(d1.estimated_hours, Some(6.0));
        assert!(plan.task("task-ds-d2").unwrap().dependencies.is_empty());
        assert!(plan.task("task-us-u1").unwrap().dependencies.is_empty());
        assert_eq!(plan.task("task-sc-s1").unwrap().dependencies, vec!["task-core"]);
    }

    #[test]
    fn dangling_link_target_is_warned_and_pruned() {
        let project = project(vec![feature("api", FeaturePriority::Medium, &[])], vec![requires("api", "missing")]);

        let result = submit_plan(&ctx(), &project, &features_only());

        assert!(result.success);
        assert_eq!(result.warnings, vec!["Task 'task-api' depends on unknown task 'task-missing'"]);
        let plan = result.plan.unwrap();
        assert!(plan.task("task-api").unwrap().dependencies.is_empty());
        assert_eq!(plan.execution_order, vec!["task-api"]);
    }

    #[test]
    fn link_from_unknown_feature_is_warned() {
        let project = project(vec![feature("api", FeaturePriority::Medium, &[])], vec![requires("ghost", "api")]);
        let result = submit_plan(&ctx(), &project, &features_only());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("unknown feature 'ghost'"));
    }

    #[test]
    fn cycle_warns_once_and_still_creates_plan() {
        let project = project(
            vec![
                feature("a", FeaturePriority::Medium, &[]),
                feature("b", FeaturePriority::Medium, &[]),
                feature("c", FeaturePriority::Medium, &[]),
                feature("d", FeaturePriority::Medium, &[]),
            ],
            vec![requires("a", "b"), requires("b", "a"), requires("c", "d"), requires("d", "c")],
        );

        let result = submit_plan(&ctx(), &project, &features_only());

        assert!(result.success);
        let cycle_warnings: Vec<_> =
            result.warnings.iter().filter(|w| w.starts_with("Circular dependency")).collect();
        assert_eq!(cycle_warnings.len(), 1);
        assert_eq!(cycle_warnings[0], "Circular dependency detected: task-a -> task-b -> task-a");
        assert!(result.plan.unwrap().execution_order.is_empty());
    }

    #[test]
    fn empty_plan_fails() {
        let result = submit_plan(&ctx(), &project(vec![], vec![]), &PlanConfig::default());
        assert!(!result.success);
        assert!(result.plan.is_none());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn duplicate_feature_ids_fail() {
        let project = project(
            vec![feature("a", FeaturePriority::Medium, &[]), feature("a", FeaturePriority::High, &[])],
            vec![],
        );
        let result = submit_plan(&ctx(), &project, &features_only());
        assert!(!result.success);
        assert_eq!(result.errors, vec!["Duplicate task id 'task-a'"]);
    }

    #[test]
    fn auto_start_activates_and_marks_ready() {
        let project = project(
            vec![feature("a", FeaturePriority::Medium, &[]), feature("b", FeaturePriority::Medium, &[])],
            vec![requires("b", "a")],
        );
        let config = PlanConfig { auto_start: true, ..features_only() };

        let plan = submit_plan(&ctx(), &project, &config).plan.unwrap();

        assert_eq!(plan.status, PlanStatus::Active);
        assert!(plan.started_at.is_some());
        assert_eq!(plan.task("task-a").unwrap().status, TaskStatus::Ready);
        assert_eq!(plan.task("task-b").unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn identical_input_reproduces_identical_order() {
        let project = project(
            vec![
                feature("a", FeaturePriority::Low, &["x"]),
                feature("b", FeaturePriority::Critical, &["y", "z"]),
                feature("c", FeaturePriority::High, &[]),
            ],
            vec![requires("c", "a")],
        );
        let first = submit_plan(&ctx(), &project, &PlanConfig::default()).plan.unwrap();
        let second = submit_plan(&ctx(), &project, &PlanConfig::default()).plan.unwrap();
        assert_eq!(first.execution_order, second.execution_order);
    }
}
