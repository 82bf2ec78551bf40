// src/watch/debounce.rs

//! Trailing-edge debouncing of watch triggers.
//!
//! Pure state; the dispatcher in [`super::watcher`] owns the clock and asks
//! for due triggers whenever the earliest deadline passes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::engine::TaskName;
use crate::types::ReloadKind;

#[derive(Debug, Clone, Copy)]
struct PendingTrigger {
    reload: Option<ReloadKind>,
    deadline: Instant,
}

/// Coalesces triggers for the same task that arrive within `window` of each
/// other into a single trigger fired `window` after the last one.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: HashMap<TaskName, PendingTrigger>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    /// A zero window disables debouncing entirely.
    pub fn is_enabled(&self) -> bool {
        !self.window.is_zero()
    }

    /// Record a trigger at `now`, pushing back the task's deadline.
    pub fn record(&mut self, task: &str, reload: Option<ReloadKind>, now: Instant) {
        let deadline = now + self.window;
        self.pending
            .entry(task.to_string())
            .and_modify(|p| {
                p.deadline = deadline;
                p.reload = p.reload.or(reload);
            })
            .or_insert(PendingTrigger { reload, deadline });
    }

    /// Earliest deadline among pending triggers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    /// Remove and return every trigger whose deadline is at or before `now`,
    /// sorted by task name.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TaskName, Option<ReloadKind>)> {
        let due: Vec<TaskName> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(name, _)| name.clone())
            .collect();

        let mut out: Vec<_> = due
            .into_iter()
            .filter_map(|name| self.pending.remove(&name).map(|p| (name, p.reload)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
