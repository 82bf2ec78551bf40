// src/dag/task_info.rs

//! Per-run task state and scheduled task types.

use crate::dag::graph::TaskAction;
use crate::engine::TaskName;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Task is part of this run but waiting on dependencies.
    Pending,
    /// Task has been dispatched to the executor and is currently running.
    Running,
    /// Task has logically completed successfully for this run
    /// (either via progress or completion with success).
    DoneSuccess,
    /// Task failed in this run (or was blocked by a failed dependency).
    DoneFailed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::DoneSuccess | RunState::DoneFailed)
    }
}

/// Public, read-only view of a task's per-run state.
///
/// This is exposed for tests and diagnostics without leaking the internal
/// `RunState` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not participating in this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
        }
    }
}

/// Description of a task that the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub action: TaskAction,
    /// Run this invocation belongs to. Several runs may be active at once.
    pub run_id: u64,
}
