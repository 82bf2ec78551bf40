// src/serve/reload.rs

use tokio::sync::broadcast;

use crate::types::ReloadKind;

/// Fan-out of reload notifications to every connected browser.
///
/// Cloning is cheap; every clone feeds the same subscribers.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadKind>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self { tx }
    }

    /// Send `kind` to current subscribers. Returns how many received it;
    /// zero when no browser is connected.
    pub fn broadcast(&self, kind: ReloadKind) -> usize {
        self.tx.send(kind).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadKind> {
        self.tx.subscribe()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}
