// src/dag/state_manager.rs

//! Per-run state transitions for tasks in one run.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::task_info::{RunState, ScheduledTask};
use crate::engine::TaskName;

/// Manages the state map of a single run against the shared graph.
pub struct StateManager<'a> {
    graph: &'a TaskGraph,
    states: &'a mut BTreeMap<TaskName, RunState>,
    run_id: u64,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        states: &'a mut BTreeMap<TaskName, RunState>,
        run_id: u64,
    ) -> Self {
        Self {
            graph,
            states,
            run_id,
        }
    }

    /// Include every member of `closure` in this run as `Pending`.
    pub fn mark_pending(&mut self, closure: &BTreeSet<TaskName>) {
        for name in closure {
            self.states.entry(name.clone()).or_insert_with(|| {
                debug!(task = %name, run_id = self.run_id, "marked Pending for this run");
                RunState::Pending
            });
        }
    }

    pub fn set_state(&mut self, task: &str, state: RunState) {
        self.states.insert(task.to_string(), state);
    }

    /// Determine whether all dependencies of the given task are satisfied
    /// for this run.
    pub fn deps_satisfied(&self, task: &str) -> bool {
        ReadOnlyStateManager::new(self.graph, self.states).deps_satisfied(task)
    }

    /// Mark all participating dependents (transitively, over hard and soft
    /// edges) of a failed task as `DoneFailed`.
    ///
    /// Returns the list of tasks that were newly marked as failed (excluding
    /// the root task; the caller adds that separately).
    pub fn mark_dependents_failed(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();
        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(state) = self.states.get_mut(&name) {
                match state {
                    RunState::Pending | RunState::Running => {
                        *state = RunState::DoneFailed;
                        debug!(
                            task = %name,
                            run_id = self.run_id,
                            "marking dependent as DoneFailed due to upstream failure"
                        );
                        stack.extend(self.graph.dependents_of(&name).iter().cloned());
                        newly_failed.push(name);
                    }
                    RunState::DoneSuccess | RunState::DoneFailed => {
                        // Already terminal.
                    }
                }
            }
        }

        newly_failed
    }

    /// Collect tasks that are `Pending` and whose dependencies are satisfied,
    /// mark them as `Running`, and return them as `ScheduledTask`s.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        // Decide first, then mutate.
        let candidates: Vec<TaskName> = self
            .states
            .iter()
            .filter(|(name, state)| {
                matches!(state, RunState::Pending) && self.deps_satisfied(name)
            })
            .map(|(name, _)| name.clone())
            .collect();

        let mut ready = Vec::new();
        for name in candidates {
            let Some(spec) = self.graph.spec(&name) else {
                warn!(task = %name, "task in run but not in graph");
                continue;
            };

            info!(task = %name, run_id = self.run_id, "scheduling task");
            self.states.insert(name.clone(), RunState::Running);
            ready.push(ScheduledTask {
                name,
                action: spec.action,
                run_id: self.run_id,
            });
        }

        ready
    }
}

/// A read-only view for checking dependency satisfaction.
pub struct ReadOnlyStateManager<'a> {
    graph: &'a TaskGraph,
    states: &'a BTreeMap<TaskName, RunState>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(graph: &'a TaskGraph, states: &'a BTreeMap<TaskName, RunState>) -> Self {
        Self { graph, states }
    }

    /// A task is ready when every hard prerequisite succeeded in this run and
    /// every soft prerequisite either is not part of the run or succeeded.
    pub fn deps_satisfied(&self, task: &str) -> bool {
        let hard_ok = self
            .graph
            .dependencies_of(task)
            .iter()
            .all(|dep| matches!(self.states.get(dep), Some(RunState::DoneSuccess)));

        let soft_ok = self
            .graph
            .soft_dependencies_of(task)
            .iter()
            .all(|dep| matches!(self.states.get(dep), None | Some(RunState::DoneSuccess)));

        hard_ok && soft_ok
    }
}
