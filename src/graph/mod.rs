//! Dependency graph over opaque task identifiers.
//!
//! Records "X depends on Y" edges and answers structural queries. The graph
//! performs no validation of its own: dangling references, self-loops, and
//! cycles are all representable, and consumers decide what to tolerate.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Directed graph keyed by task ID.
///
/// Both directions are indexed: `dependencies` maps a task to what it needs,
/// `dependents` maps a task to what needs it. Ordered collections keep every
/// query deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependencies: BTreeMap<String, BTreeSet<String>>,
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a vertex. No-op if already present.
    pub fn add_node(&mut self, id: &str) {
        if !self.dependencies.contains_key(id) {
            self.dependencies.insert(id.to_string(), BTreeSet::new());
            self.dependents.insert(id.to_string(), BTreeSet::new());
        }
    }

    /// Records that `dependent` requires `dependency`, registering both.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        self.add_node(dependent);
        self.add_node(dependency);
        if let Some(deps) = self.dependencies.get_mut(dependent) {
            deps.insert(dependency.to_string());
        }
        if let Some(users) = self.dependents.get_mut(dependency) {
            users.insert(dependent.to_string());
        }
    }

    /// Returns `true` if `id` is a registered vertex.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.dependencies.contains_key(id)
    }

    /// Number of registered vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Returns `true` when no vertex is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// All registered vertices in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    /// Direct dependencies of `id` (empty for unknown IDs).
    #[must_use]
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.dependencies
            .get(id)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Direct dependents of `id` (empty for unknown IDs).
    #[must_use]
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.dependents
            .get(id)
            .map(|users| users.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every task that would be affected if `id` failed, nearest first.
    ///
    /// `id` itself is never included, even when a cycle leads back to it.
    #[must_use]
    pub fn transitive_dependents(&self, id: &str) -> Vec<String> {
        Self::closure(id, &self.dependents)
    }

    /// Every task `id` transitively depends on, nearest first.
    #[must_use]
    pub fn transitive_dependencies(&self, id: &str) -> Vec<String> {
        Self::closure(id, &self.dependencies)
    }

    fn closure(id: &str, edges: &BTreeMap<String, BTreeSet<String>>) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            let Some(next) = edges.get(current) else { continue };
            for neighbor in next {
                if seen.insert(neighbor.as_str()) {
                    out.push(neighbor.clone());
                    queue.push_back(neighbor.as_str());
                }
            }
        }

        out
    }

    /// Returns the first dependency cycle found, if any.
    ///
    /// The cycle is reported as a path that starts and ends on the same ID,
    /// e.g. `["a", "b", "a"]`. Uses an explicit stack, so deep graphs cannot
    /// overflow the call stack.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited: HashSet<&str> = HashSet::new();

        for start in self.dependencies.keys() {
            if visited.contains(start.as_str()) {
                continue;
            }
            if let Some(cycle) = self.cycle_from(start, &mut visited) {
                return Some(cycle);
            }
        }

        None
    }

    fn cycle_from<'a>(&'a self, start: &'a str, visited: &mut HashSet<&'a str>) -> Option<Vec<String>> {
        // Each frame is a node on the recursion stack plus the index of the
        // next dependency to explore.
        let mut frames: Vec<(&'a str, usize)> = vec![(start, 0)];
        let mut on_stack: HashSet<&'a str> = HashSet::from([start]);
        visited.insert(start);

        while let Some((node, cursor)) = frames.last_mut() {
            let node = *node;
            let deps = self.dependencies_of(node);
            if *cursor >= deps.len() {
                frames.pop();
                on_stack.remove(node);
                continue;
            }
            let dep = deps[*cursor];
            *cursor += 1;

            if on_stack.contains(dep) {
                let begin = frames.iter().position(|(n, _)| *n == dep).unwrap_or(0);
                let mut cycle: Vec<String> =
                    frames[begin..].iter().map(|(n, _)| (*n).to_string()).collect();
                cycle.push(dep.to_string());
                return Some(cycle);
            }
            if visited.insert(dep) {
                on_stack.insert(dep);
                frames.push((dep, 0));
            }
        }

        None
    }
}
