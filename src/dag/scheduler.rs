// src/dag/scheduler.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::{RunSummary, SchedulerStep};
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{RunState, TaskRunState};
use crate::engine::{TaskName, TaskOutcome, TriggerReason};
use crate::types::ReloadKind;

/// One active run: its members and their states.
#[derive(Debug, Clone)]
struct RunPlan {
    reason: TriggerReason,
    roots: Vec<TaskName>,
    states: BTreeMap<TaskName, RunState>,
    on_success: Option<ReloadKind>,
}

/// Scheduler holds the immutable graph plus the state of every active run.
///
/// It is responsible for:
/// - pulling hard prerequisites into a run
/// - deciding when a task is ready (hard deps succeeded, soft deps absent or
///   succeeded)
/// - marking tasks as succeeded/failed/progressed
/// - failing dependents when a task fails
///
/// Runs are independent: the same task may be active in several runs at
/// once, and no ordering is implied between runs.
#[derive(Debug)]
pub struct Scheduler {
    graph: Arc<TaskGraph>,
    runs: BTreeMap<u64, RunPlan>,
    /// Monotonically increasing run ID.
    run_counter: u64,
}

impl Scheduler {
    pub fn new(graph: Arc<TaskGraph>) -> Self {
        Self {
            graph,
            runs: BTreeMap::new(),
            run_counter: 0,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.runs.is_empty()
    }

    /// IDs of the active runs, ascending.
    pub fn active_runs(&self) -> Vec<u64> {
        self.runs.keys().copied().collect()
    }

    /// Whether `task` is pending or running in any active run.
    pub fn is_task_active(&self, task: &str) -> bool {
        self.runs.values().any(|run| {
            matches!(
                run.states.get(task),
                Some(RunState::Pending) | Some(RunState::Running)
            )
        })
    }

    /// Read-only view of a task's state in the given run.
    ///
    /// Returns `None` if the run is not active or the task is unknown.
    pub fn run_state_of(&self, run_id: u64, task: &str) -> Option<TaskRunState> {
        if !self.graph.contains(task) {
            return None;
        }
        let run = self.runs.get(&run_id)?;
        Some(run.states.get(task).copied().into())
    }

    /// Whether the dependencies of `task` are satisfied in the given run.
    pub fn deps_satisfied(&self, run_id: u64, task: &str) -> Option<bool> {
        let run = self.runs.get(&run_id)?;
        Some(ReadOnlyStateManager::new(&self.graph, &run.states).deps_satisfied(task))
    }

    /// Start a new run for `tasks` and their hard prerequisites.
    ///
    /// Unknown names are ignored with a warning; callers resolve aliases and
    /// report unknown tasks before this point.
    pub fn start_run(
        &mut self,
        tasks: &[TaskName],
        reason: TriggerReason,
        on_success: Option<ReloadKind>,
    ) -> SchedulerStep {
        self.run_counter += 1;
        let run_id = self.run_counter;

        let roots: Vec<TaskName> = tasks
            .iter()
            .filter(|t| {
                let known = self.graph.contains(t);
                if !known {
                    warn!(task = %t, "trigger for unknown task; ignoring");
                }
                known
            })
            .cloned()
            .collect();
        let closure = self.graph.closure(&roots);

        info!(run_id, ?reason, ?roots, members = closure.len(), "starting run");

        let mut plan = RunPlan {
            reason,
            roots,
            states: BTreeMap::new(),
            on_success,
        };

        let mut manager = StateManager::new(&self.graph, &mut plan.states, run_id);
        manager.mark_pending(&closure);
        let newly_scheduled = manager.collect_new_ready_tasks();

        self.runs.insert(run_id, plan);

        SchedulerStep {
            newly_scheduled,
            ..self.finish_step(run_id, Vec::new())
        }
    }

    /// A long-lived task reported that it is logically done for this run.
    pub fn handle_progress(&mut self, run_id: u64, task: &str) -> SchedulerStep {
        let graph = Arc::clone(&self.graph);
        let Some(run) = self.runs.get_mut(&run_id) else {
            debug!(task = %task, run_id, "progress for inactive run; ignoring");
            return SchedulerStep::empty(run_id);
        };

        match run.states.get(task).copied() {
            Some(RunState::Running | RunState::Pending) => {
                debug!(task = %task, run_id, "task reported progress; marking DoneSuccess");
                run.states.insert(task.to_string(), RunState::DoneSuccess);
            }
            Some(_) => {
                debug!(task = %task, run_id, "progress for terminal task; ignoring");
                return SchedulerStep::empty(run_id);
            }
            None => {
                warn!(task = %task, run_id, "progress from task not in run; ignoring");
                return SchedulerStep::empty(run_id);
            }
        }

        let newly_scheduled =
            StateManager::new(&graph, &mut run.states, run_id).collect_new_ready_tasks();

        SchedulerStep {
            newly_scheduled,
            ..self.finish_step(run_id, Vec::new())
        }
    }

    /// A task finished with a concrete outcome.
    pub fn handle_completion(
        &mut self,
        run_id: u64,
        task: &str,
        outcome: TaskOutcome,
    ) -> SchedulerStep {
        let graph = Arc::clone(&self.graph);
        let Some(run) = self.runs.get_mut(&run_id) else {
            debug!(task = %task, run_id, "completion for inactive run; ignoring");
            return SchedulerStep::empty(run_id);
        };

        match run.states.get(task) {
            Some(RunState::Running) | Some(RunState::Pending) => {}
            Some(_) => {
                // e.g. a long-lived task exiting after it already progressed.
                debug!(task = %task, run_id, "completion for terminal task; ignoring");
                return SchedulerStep::empty(run_id);
            }
            None => {
                warn!(task = %task, run_id, "completion for task not in run; ignoring");
                return SchedulerStep::empty(run_id);
            }
        }

        let mut newly_scheduled = Vec::new();
        let mut newly_failed = Vec::new();
        let mut manager = StateManager::new(&graph, &mut run.states, run_id);

        match outcome {
            TaskOutcome::Success => {
                debug!(task = %task, run_id, "task completed successfully");
                manager.set_state(task, RunState::DoneSuccess);
                newly_scheduled = manager.collect_new_ready_tasks();
            }
            TaskOutcome::Failed(reason) => {
                warn!(
                    task = %task,
                    run_id,
                    %reason,
                    "task failed; failing dependents in this run"
                );
                manager.set_state(task, RunState::DoneFailed);
                newly_failed.push(task.to_string());
                newly_failed.extend(manager.mark_dependents_failed(task));
            }
        }

        SchedulerStep {
            newly_scheduled,
            ..self.finish_step(run_id, newly_failed)
        }
    }

    /// Build the tail of a step: remove the run and summarise it if every
    /// member is terminal.
    fn finish_step(&mut self, run_id: u64, newly_failed: Vec<TaskName>) -> SchedulerStep {
        let finished = match self.runs.get(&run_id) {
            Some(run) if run.states.values().all(|s| s.is_terminal()) => {
                self.runs.remove(&run_id).map(|run| summarise(run_id, run))
            }
            _ => None,
        };

        if let Some(summary) = &finished {
            info!(
                run_id,
                success = summary.is_success(),
                failed = ?summary.failed,
                "run finished"
            );
        }

        SchedulerStep {
            run_id,
            newly_scheduled: Vec::new(),
            newly_failed,
            finished,
        }
    }
}

fn summarise(run_id: u64, run: RunPlan) -> RunSummary {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for (name, state) in run.states {
        match state {
            RunState::DoneFailed => failed.push(name),
            _ => succeeded.push(name),
        }
    }

    let on_success = if failed.is_empty() { run.on_success } else { None };

    RunSummary {
        run_id,
        reason: run.reason,
        roots: run.roots,
        succeeded,
        failed,
        on_success,
    }
}
