// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::engine::{TaskName, TriggerReason};
use crate::types::ReloadKind;

/// Final state of a run, produced once every member is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: u64,
    pub reason: TriggerReason,
    /// Tasks the run was started for (after alias resolution).
    pub roots: Vec<TaskName>,
    pub succeeded: Vec<TaskName>,
    pub failed: Vec<TaskName>,
    /// Reload to broadcast because the run succeeded.
    pub on_success: Option<ReloadKind>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the DAG and make
/// assertions about what changed.
#[derive(Debug, Clone)]
pub struct SchedulerStep {
    /// Run the step applied to.
    pub run_id: u64,
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks that were newly marked as failed in this step (including the
    /// task that failed and any dependents).
    pub newly_failed: Vec<TaskName>,
    /// Set when this step finished the run.
    pub finished: Option<RunSummary>,
}

impl SchedulerStep {
    pub(crate) fn empty(run_id: u64) -> Self {
        Self {
            run_id,
            newly_scheduled: Vec::new(),
            newly_failed: Vec::new(),
            finished: None,
        }
    }

    pub fn run_just_finished(&self) -> bool {
        self.finished.is_some()
    }
}
