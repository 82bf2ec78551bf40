// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::types::ReloadKind;
use crate::watch::bindings::{WatchBinding, matching_bindings};
use crate::watch::debounce::Debouncer;
use crate::watch::path_utils::{is_within, relative_str};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Static inputs of the watch dispatcher.
#[derive(Debug, Clone)]
pub struct WatchSetup {
    /// Project root; binding patterns are relative to it.
    pub root: PathBuf,
    /// Output tree; changes under it are ignored.
    pub dest_root: PathBuf,
    pub bindings: Vec<WatchBinding>,
    pub debounce: Duration,
}

/// Spawn a filesystem watcher on `setup.root` (recursive) and a dispatcher
/// that turns matching change events into `RuntimeEvent::TaskTriggered`.
pub fn spawn_watcher(
    setup: WatchSetup,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = setup
        .root
        .canonicalize()
        .unwrap_or_else(|_| setup.root.clone());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // No tracing context in the notify thread; fall back to stderr.
                    eprintln!("assetdag: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetdag: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!(
        root = %root.display(),
        bindings = setup.bindings.len(),
        debounce_ms = setup.debounce.as_millis() as u64,
        "file watcher started"
    );

    let dispatcher = Dispatcher {
        root,
        dest_root: setup.dest_root,
        bindings: Arc::new(setup.bindings),
        debouncer: Debouncer::new(setup.debounce),
        runtime_tx,
    };
    tokio::spawn(dispatcher.run(event_rx));

    Ok(WatcherHandle { _inner: watcher })
}

/// Single consumer of notify events.
struct Dispatcher {
    root: PathBuf,
    dest_root: PathBuf,
    bindings: Arc<Vec<WatchBinding>>,
    debouncer: Debouncer,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl Dispatcher {
    async fn run(mut self, mut event_rx: mpsc::UnboundedReceiver<Event>) {
        loop {
            let deadline = self.debouncer.next_deadline();

            tokio::select! {
                maybe_event = event_rx.recv() => {
                    let Some(event) = maybe_event else { break };
                    if !self.handle_event(event).await {
                        break;
                    }
                }
                _ = sleep_until(deadline), if deadline.is_some() => {
                    let due = self.debouncer.take_due(std::time::Instant::now());
                    for (task, reload) in due {
                        if !self.trigger(task, reload).await {
                            return;
                        }
                    }
                }
            }
        }
        debug!("watch dispatcher finished");
    }

    /// Returns `false` once the runtime is gone.
    async fn handle_event(&mut self, event: Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return true;
        }

        let rel_paths: Vec<String> = event
            .paths
            .iter()
            .filter(|path| !is_within(&self.dest_root, path))
            .filter_map(|path| relative_str(&self.root, path))
            .collect();
        if rel_paths.is_empty() {
            return true;
        }

        debug!(kind = ?event.kind, paths = ?rel_paths, "change detected");

        let hits = matching_bindings(&self.bindings, rel_paths.iter().map(String::as_str));
        let bindings = Arc::clone(&self.bindings);
        for idx in hits {
            let binding = &bindings[idx];
            if self.debouncer.is_enabled() {
                self.debouncer
                    .record(&binding.task, binding.reload, std::time::Instant::now());
            } else if !self.trigger(binding.task.clone(), binding.reload).await {
                return false;
            }
        }
        true
    }

    async fn trigger(&self, task: String, reload: Option<ReloadKind>) -> bool {
        info!(task = %task, "file change; triggering task");
        let sent = self
            .runtime_tx
            .send(RuntimeEvent::TaskTriggered {
                tasks: vec![task],
                reason: TriggerReason::FileWatch,
                reload,
            })
            .await;
        if sent.is_err() {
            warn!("runtime channel closed; stopping watch dispatcher");
            return false;
        }
        true
    }
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending::<()>().await,
    }
}
