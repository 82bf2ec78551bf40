// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::{RunSummary, ScheduledTask};
use crate::engine::TriggerReason;
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::serve::ReloadHub;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// What happened while the runtime was alive.
#[derive(Debug, Clone, Default)]
pub struct RuntimeReport {
    /// Every finished run, in completion order.
    pub runs: Vec<RunSummary>,
}

impl RuntimeReport {
    /// Failed tasks of manual runs, in completion order.
    pub fn failed_manual_tasks(&self) -> Vec<String> {
        self.runs
            .iter()
            .filter(|r| r.reason == TriggerReason::Manual)
            .flat_map(|r| r.failed.iter().cloned())
            .collect()
    }
}

/// Drives the scheduler in response to `RuntimeEvent`s, and delegates
/// actual task execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    reload: ReloadHub,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        executor: E,
        reload: ReloadHub,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reload,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core (spawn tasks, reload, exit).
    pub async fn run(mut self) -> Result<RuntimeReport> {
        info!("assetdag runtime started");
        let mut report = RuntimeReport::default();

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command, &mut report).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!(runs = report.runs.len(), "runtime exiting");
        Ok(report)
    }

    /// Execute a single command from the core.
    async fn execute_command(
        &mut self,
        command: CoreCommand,
        report: &mut RuntimeReport,
    ) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => {
                self.spawn_ready(tasks).await?;
            }
            CoreCommand::Reload(kind) => {
                let receivers = self.reload.broadcast(kind);
                debug!(?kind, receivers, "reload broadcast");
            }
            CoreCommand::RunFinished(summary) => {
                report.runs.push(summary);
            }
            CoreCommand::RequestExit => {
                // keep_running=false on the same step ends the loop.
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        let run_ids: Vec<_> = tasks.iter().map(|t| t.run_id).collect();
        debug!(?names, ?run_ids, "spawning ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
