use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use assetdag::dag::ScheduledTask;
use assetdag::engine::{RuntimeEvent, TaskOutcome};
use assetdag::errors::Result;
use assetdag::exec::ExecutorBackend;

/// A fake executor that:
/// - records which tasks were "run" (name and run id)
/// - immediately reports completion for each scheduled task, failing the
///   ones listed in `failing`
/// - reports only progress for tasks listed in `long_lived` (like `serve`)
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<(String, u64)>>>,
    failing: HashSet<String>,
    long_lived: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<(String, u64)>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
            long_lived: HashSet::new(),
        }
    }

    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }

    pub fn long_lived(mut self, task: &str) -> Self {
        self.long_lived.insert(task.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();
        let long_lived = self.long_lived.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push((t.name.clone(), t.run_id));
                }

                let event = if long_lived.contains(&t.name) {
                    RuntimeEvent::TaskProgressed {
                        run_id: t.run_id,
                        task: t.name.clone(),
                    }
                } else {
                    let outcome = if failing.contains(&t.name) {
                        TaskOutcome::Failed("fake failure".to_string())
                    } else {
                        TaskOutcome::Success
                    };
                    RuntimeEvent::TaskCompleted {
                        run_id: t.run_id,
                        task: t.name.clone(),
                        outcome,
                        reload: None,
                    }
                };

                tx.send(event).await.map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
