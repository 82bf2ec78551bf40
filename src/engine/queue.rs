// src/engine/queue.rs

use std::collections::BTreeMap;

use tracing::debug;

use crate::engine::TaskName;
use crate::types::{ReloadKind, TriggerWhileRunningBehaviour};

/// Triggers that arrived while their task was still running.
///
/// Only used with [`TriggerWhileRunningBehaviour::Queue`]: any number of
/// triggers for the same task coalesce into one follow-up run, started as
/// soon as the task is no longer pending or running in any active run.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    pending: BTreeMap<TaskName, Option<ReloadKind>>,
}

impl TriggerQueue {
    pub fn new(behaviour: TriggerWhileRunningBehaviour) -> Self {
        Self {
            behaviour,
            pending: BTreeMap::new(),
        }
    }

    /// Returns the configured behaviour.
    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    /// Returns true if there are no queued triggers.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether a trigger for `task` would be queued rather than started.
    pub fn should_queue(&self, task_active: bool) -> bool {
        task_active && self.behaviour == TriggerWhileRunningBehaviour::Queue
    }

    /// Record a trigger for a running task, merging with an earlier one.
    pub fn record_trigger(&mut self, task: &str, reload: Option<ReloadKind>) {
        let entry = self.pending.entry(task.to_string()).or_insert(None);
        *entry = entry.or(reload);
        debug!(task = %task, queued = self.pending.len(), "queued trigger for running task");
    }

    /// Remove and return the queued triggers whose task is no longer active.
    pub fn take_ready<F>(&mut self, is_active: F) -> Vec<(TaskName, Option<ReloadKind>)>
    where
        F: Fn(&str) -> bool,
    {
        let ready: Vec<TaskName> = self
            .pending
            .keys()
            .filter(|task| !is_active(task))
            .cloned()
            .collect();

        ready
            .into_iter()
            .filter_map(|task| self.pending.remove(&task).map(|reload| (task, reload)))
            .collect()
    }
}
