// src/engine/mod.rs

//! Orchestration engine for assetdag.
//!
//! This module ties together:
//! - the task scheduler (one state machine per active run)
//! - the trigger queue (what happens when a watch trigger arrives for a task
//!   that is still running)
//! - the main runtime event loop that reacts to:
//!   - manual and file-watch triggers
//!   - progress reports from the long-lived `serve` task
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::types::ReloadKind;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task action for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(String),
}

/// Why a run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Tasks named on the command line.
    Manual,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once no run is active and nothing is
    /// queued. False when the invocation includes `serve`.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the CLI, watcher and executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Start a run for these tasks. `reload` is broadcast if it succeeds.
    TaskTriggered {
        tasks: Vec<TaskName>,
        reason: TriggerReason,
        reload: Option<ReloadKind>,
    },
    /// A long-lived task reported logical completion for its run.
    TaskProgressed { run_id: u64, task: TaskName },
    /// A task action finished. `reload` is what it asks browsers to do on
    /// success.
    TaskCompleted {
        run_id: u64,
        task: TaskName,
        outcome: TaskOutcome,
        reload: Option<ReloadKind>,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::{Runtime, RuntimeReport};
pub use crate::types::TriggerWhileRunningBehaviour;
