// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - broadcasting reloads
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! processes.

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    CoreStep, handle_task_completion, handle_task_progress, handle_task_trigger,
};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::types::TriggerWhileRunningBehaviour;

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(
        scheduler: Scheduler,
        behaviour: TriggerWhileRunningBehaviour,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            scheduler,
            queue: TriggerQueue::new(behaviour),
            options,
        }
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Expose queue emptiness (for tests).
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered {
                tasks,
                reason,
                reload,
            } => handle_task_trigger(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                tasks,
                reason,
                reload,
            ),
            RuntimeEvent::TaskProgressed { run_id, task } => handle_task_progress(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                run_id,
                task,
            ),
            RuntimeEvent::TaskCompleted {
                run_id,
                task,
                outcome,
                reload,
            } => handle_task_completion(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                run_id,
                task,
                outcome,
                reload,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: vec![crate::engine::CoreCommand::RequestExit],
                keep_running: false,
            },
        }
    }
}
