use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::mpsc;

use assetdag::config::ConfigFile;
use assetdag::engine::RuntimeEvent;
use assetdag::registry::PathRegistry;
use assetdag::serve::ReloadHub;
use assetdag::tasks::TaskContext;

use crate::notifier::RecordingNotifier;

/// A throwaway project directory.
pub struct Project {
    dir: TempDir,
}

/// A task context over a [`Project`], plus the pieces tests inspect.
pub struct Harness {
    pub ctx: Arc<TaskContext>,
    pub notifier: Arc<RecordingNotifier>,
    pub runtime_rx: mpsc::Receiver<RuntimeEvent>,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, contents).expect("write fixture file");
        self
    }

    pub fn mkdir(&self, rel: &str) -> &Self {
        std::fs::create_dir_all(self.path(rel)).expect("create dir");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Every file under `rel`, relative to it, with `/` separators, sorted.
    pub fn files_under(&self, rel: &str) -> Vec<String> {
        let base = self.path(rel);
        let mut out = Vec::new();
        let mut stack = vec![base.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(rel) = path.strip_prefix(&base) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }

    /// Task context rooted at this project with a recording notifier.
    pub fn harness(&self, cfg: ConfigFile) -> Harness {
        let registry = PathRegistry::from_config(self.root(), &cfg).expect("build registry");
        let notifier = Arc::new(RecordingNotifier::new());
        let (runtime_tx, runtime_rx) = mpsc::channel(64);

        let ctx = Arc::new(TaskContext {
            config: cfg,
            registry,
            notifier: notifier.clone(),
            reload: ReloadHub::new(),
            runtime_tx,
        });

        Harness {
            ctx,
            notifier,
            runtime_rx,
        }
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}
