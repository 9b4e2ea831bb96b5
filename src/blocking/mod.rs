//! Live block state for every task in a plan.
//!
//! Blocking a task walks the dependency graph forward and freezes every
//! transitive dependent. Unblocking is evaluated one task at a time against a
//! snapshot of completed tasks, so relief ripples forward as work completes.
//! Manual holds are operator-applied and never lift automatically.
//!
//! The manager has no internal locking; mutations take `&mut self`, and a
//! host sharing one manager across threads must serialize access itself.

mod record;

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graph::DependencyGraph;
use crate::ports::clock::Clock;

pub use record::{BlockReason, BlockRecord};

/// Result of a [`BlockingManager::block_task`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    /// Tasks that received a new block record, the target first when it was
    /// not already blocked.
    pub newly_blocked: Vec<String>,
    /// Tasks in the blast zone that were already blocked before the call.
    pub already_blocked: Vec<String>,
    /// Size of the blast zone including the target itself.
    pub total_affected: usize,
}

/// Result of a [`BlockingManager::unblock_task`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnblockOutcome {
    /// Tasks whose block record was removed.
    pub unblocked: Vec<String>,
    /// Tasks that remain blocked (manual hold or incomplete dependencies).
    pub still_blocked: Vec<String>,
}

/// Owns block records and manual holds for one plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockingManager {
    #[serde(default)]
    records: BTreeMap<String, BlockRecord>,
    #[serde(default)]
    holds: BTreeSet<String>,
}

impl BlockingManager {
    /// Creates a manager with nothing blocked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks `id` and cascades the block to every transitive dependent.
    ///
    /// Re-blocking an already-blocked task adds no record for it, but the
    /// graph is walked again so dependents attached since the first block
    /// are caught. Cascaded records carry `dependency-failed` and point back
    /// at `id` as their source. A record left by a manual hold is replaced,
    /// so releasing the hold later does not lift the block; the hold itself
    /// stays in place.
    pub fn block_task(
        &mut self,
        id: &str,
        graph: &DependencyGraph,
        reason: Option<BlockReason>,
        clock: &dyn Clock,
    ) -> BlockOutcome {
        let now = clock.now();
        let mut outcome = BlockOutcome::default();

        let reason = reason.unwrap_or(BlockReason::DependencyFailed);
        match self.records.get_mut(id) {
            Some(record) => {
                if record.manual {
                    *record = BlockRecord::direct(reason, now);
                }
                outcome.already_blocked.push(id.to_string());
            }
            None => {
                self.records.insert(id.to_string(), BlockRecord::direct(reason, now));
                outcome.newly_blocked.push(id.to_string());
            }
        }

        let downstream = graph.transitive_dependents(id);
        outcome.total_affected = downstream.len() + 1;
        for dependent in downstream {
            if let Some(record) = self.records.get_mut(&dependent) {
                if record.manual {
                    *record = BlockRecord::cascaded(id, now);
                }
                outcome.already_blocked.push(dependent);
            } else {
                self.records.insert(dependent.clone(), BlockRecord::cascaded(id, now));
                outcome.newly_blocked.push(dependent);
            }
        }

        info!(
            task = id,
            newly_blocked = outcome.newly_blocked.len(),
            already_blocked = outcome.already_blocked.len(),
            "block applied"
        );
        outcome
    }

    /// Re-evaluates the block on `id` against the completed set.
    ///
    /// Only direct dependencies are consulted. A held task always stays
    /// blocked. A task that is not blocked at all yields an empty outcome.
    pub fn unblock_task(
        &mut self,
        id: &str,
        graph: &DependencyGraph,
        completed: &HashSet<String>,
    ) -> UnblockOutcome {
        let mut outcome = UnblockOutcome::default();

        if self.holds.contains(id) {
            outcome.still_blocked.push(id.to_string());
            return outcome;
        }
        if !self.records.contains_key(id) {
            return outcome;
        }

        let ready = graph.dependencies_of(id).iter().all(|dep| completed.contains(*dep));
        if ready {
            self.records.remove(id);
            debug!(task = id, "block lifted");
            outcome.unblocked.push(id.to_string());
        } else {
            outcome.still_blocked.push(id.to_string());
        }
        outcome
    }

    /// Places an operator hold on `id`. Returns `false` if already held.
    ///
    /// A task with no block record gets a `manual-hold` record.
    pub fn add_manual_hold(&mut self, id: &str, clock: &dyn Clock) -> bool {
        if !self.holds.insert(id.to_string()) {
            return false;
        }
        self.records
            .entry(id.to_string())
            .or_insert_with(|| BlockRecord::manual(clock.now()));
        info!(task = id, "manual hold placed");
        true
    }

    /// Removes the operator hold on `id`. Returns `false` if none existed.
    ///
    /// A record created by the hold goes with it; a cascade record
    /// underneath stays until the dependencies complete.
    pub fn remove_manual_hold(&mut self, id: &str) -> bool {
        if !self.holds.remove(id) {
            return false;
        }
        if self.records.get(id).is_some_and(|record| record.manual) {
            self.records.remove(id);
        }
        info!(task = id, "manual hold released");
        true
    }

    /// Upstream tasks that are blocked and that `id` transitively depends on,
    /// nearest first. Explains why `id` cannot run.
    #[must_use]
    pub fn blocking_chain(&self, id: &str, graph: &DependencyGraph) -> Vec<String> {
        graph.transitive_dependencies(id).into_iter().filter(|dep| self.is_blocked(dep)).collect()
    }

    /// The block record for `id`, if any.
    #[must_use]
    pub fn block_info(&self, id: &str) -> Option<&BlockRecord> {
        self.records.get(id)
    }

    /// All blocked task IDs with their records, sorted by ID.
    #[must_use]
    pub fn blocked_tasks(&self) -> Vec<(&str, &BlockRecord)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record)).collect()
    }

    /// Returns `true` if `id` has a block record or a manual hold.
    #[must_use]
    pub fn is_blocked(&self, id: &str) -> bool {
        self.records.contains_key(id) || self.holds.contains(id)
    }

    /// Returns `true` if `id` carries a manual hold.
    #[must_use]
    pub fn is_held(&self, id: &str) -> bool {
        self.holds.contains(id)
    }

    /// Forgets `id` once it has completed: its record and any hold go.
    /// Returns `true` if anything was removed.
    ///
    /// Dependents keep their own records; they lift through
    /// [`Self::unblock_task`] as their dependencies complete.
    pub fn resolve_task(&mut self, id: &str) -> bool {
        let had_record = self.records.remove(id).is_some();
        let had_hold = self.holds.remove(id);
        if had_record || had_hold {
            debug!(task = id, "completed task cleared");
        }
        had_record || had_hold
    }

    /// Drops every record and hold.
    pub fn clear(&mut self) {
        self.records.clear();
        self.holds.clear();
    }
}

/// Every task transitively downstream of `id`.
#[must_use]
pub fn tasks_blocked_by(id: &str, graph: &DependencyGraph) -> Vec<String> {
    graph.transitive_dependents(id)
}

/// How many tasks (excluding `id`) would be frozen if `id` were blocked.
///
/// Counts with a breadth-first walk rather than materializing the set.
#[must_use]
pub fn calculate_blast_radius(id: &str, graph: &DependencyGraph) -> usize {
    let mut seen: HashSet<&str> = HashSet::from([id]);
    let mut queue: VecDeque<&str> = VecDeque::from([id]);
    while let Some(current) = queue.pop_front() {
        for dependent in graph.dependents_of(current) {
            if seen.insert(dependent) {
                queue.push_back(dependent);
            }
        }
    }
    seen.len() - 1
}
