// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor implementation in [`executor_loop`].
//!
//! - `RealExecutorBackend` is the default implementation used by `assetdag`.
//!   It wraps the executor loop and forwards scheduled tasks over an mpsc
//!   channel.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which tasks were scheduled and directly emits `TaskCompleted` events.
//!
//! [`executor_loop`]: super::executor_loop

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dag::ScheduledTask;
use crate::errors::{Error, Result};
use crate::tasks::TaskContext;

use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled tasks are executed.
///
/// Production code uses [`RealExecutorBackend`]; tests can provide their own
/// implementation that doesn't touch the filesystem.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledTask>,
}

impl RealExecutorBackend {
    /// Create a new real executor backend around the shared task context.
    ///
    /// This spawns the background executor loop immediately.
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        let tx = spawn_executor(ctx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
