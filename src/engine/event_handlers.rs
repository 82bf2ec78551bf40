// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use crate::dag::{RunSummary, ScheduledTask, Scheduler, SchedulerStep};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};
use crate::types::ReloadKind;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Tell connected browsers to refresh.
    Reload(ReloadKind),
    /// A run reached a terminal state.
    RunFinished(RunSummary),
    /// Request that the process exits.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a trigger.
///
/// - Manual triggers always form one run.
/// - Watch triggers start a new, independent run right away (overlap). In
///   queue mode, tasks still active in some run are queued instead and the
///   rest start immediately.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    tasks: Vec<TaskName>,
    reason: TriggerReason,
    reload: Option<ReloadKind>,
) -> CoreStep {
    let mut to_start = Vec::new();

    for task in tasks {
        if reason == TriggerReason::FileWatch
            && queue.should_queue(scheduler.is_task_active(&task))
        {
            queue.record_trigger(&task, reload);
        } else {
            to_start.push(task);
        }
    }

    if to_start.is_empty() {
        return CoreStep::running(Vec::new());
    }

    let step = scheduler.start_run(&to_start, reason, reload);
    let mut commands = Vec::new();
    let keep_running = apply_step(scheduler, queue, options, step, &mut commands);

    CoreStep {
        commands,
        keep_running,
    }
}

/// Handle a progress report from a long-lived task.
pub fn handle_task_progress(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    run_id: u64,
    task: TaskName,
) -> CoreStep {
    let step = scheduler.handle_progress(run_id, &task);
    let mut commands = Vec::new();
    let keep_running = apply_step(scheduler, queue, options, step, &mut commands);

    CoreStep {
        commands,
        keep_running,
    }
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    run_id: u64,
    task: TaskName,
    outcome: TaskOutcome,
    reload: Option<ReloadKind>,
) -> CoreStep {
    let mut commands = Vec::new();

    if outcome == TaskOutcome::Success {
        if let Some(kind) = reload {
            commands.push(CoreCommand::Reload(kind));
        }
    }

    let step = scheduler.handle_completion(run_id, &task, outcome);
    let keep_running = apply_step(scheduler, queue, options, step, &mut commands);

    CoreStep {
        commands,
        keep_running,
    }
}

/// Turn a scheduler step into commands, start any queued follow-up runs and
/// decide whether the loop continues.
fn apply_step(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    step: SchedulerStep,
    commands: &mut Vec<CoreCommand>,
) -> bool {
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    let Some(summary) = step.finished else {
        return true;
    };

    let manual_failure = summary.reason == TriggerReason::Manual && !summary.is_success();
    if let Some(kind) = summary.on_success {
        commands.push(CoreCommand::Reload(kind));
    }
    commands.push(CoreCommand::RunFinished(summary));

    // A failed invocation ends the process even when serving was requested.
    if manual_failure {
        commands.push(CoreCommand::RequestExit);
        return false;
    }

    start_queued_runs(scheduler, queue, commands);

    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        commands.push(CoreCommand::RequestExit);
        return false;
    }

    true
}

/// Start one follow-up run per queued task that is no longer active.
fn start_queued_runs(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    commands: &mut Vec<CoreCommand>,
) {
    let ready = queue.take_ready(|task| scheduler.is_task_active(task));

    for (task, reload) in ready {
        let step = scheduler.start_run(&[task], TriggerReason::FileWatch, reload);
        if !step.newly_scheduled.is_empty() {
            commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
        }
        if let Some(summary) = step.finished {
            commands.push(CoreCommand::RunFinished(summary));
        }
    }
}
