// src/exec/executor_loop.rs

//! Main executor loop: runs every scheduled task action on its own Tokio task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::tasks::{TaskContext, run_action};

/// Spawn the background executor loop.
///
/// The returned sender is what [`super::RealExecutorBackend`] forwards
/// scheduled tasks to. Each task runs in its own Tokio task, so independent
/// tasks, and repeated invocations of the same task from different runs,
/// proceed concurrently.
pub fn spawn_executor(ctx: Arc<TaskContext>) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");
        while let Some(task) = rx.recv().await {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                run_task(task, ctx).await;
            });
        }
        info!("executor loop finished (channel closed)");
    });

    tx
}

/// Run one task action and report its completion.
///
/// Errors become a failed completion; they are also logged via
/// `tracing::error!`.
async fn run_task(task: ScheduledTask, ctx: Arc<TaskContext>) {
    info!(task = %task.name, run_id = task.run_id, action = %task.action, "starting task");
    let started = std::time::Instant::now();

    let (outcome, reload) = match run_action(&ctx, &task).await {
        Ok(reload) => (TaskOutcome::Success, reload),
        Err(err) => {
            error!(
                task = %task.name,
                run_id = task.run_id,
                error = %format!("{err:#}"),
                "task failed"
            );
            (TaskOutcome::Failed(format!("{err:#}")), None)
        }
    };

    info!(
        task = %task.name,
        run_id = task.run_id,
        success = outcome == TaskOutcome::Success,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "task finished"
    );

    let sent = ctx
        .runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            run_id: task.run_id,
            task: task.name,
            outcome,
            reload,
        })
        .await;
    if sent.is_err() {
        info!("runtime gone; dropping task completion");
    }
}
