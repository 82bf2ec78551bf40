// src/tasks/mod.rs

//! Task actions: what each node of the task graph does when it runs.
//!
//! Every transform works file by file. A failure on one file is recorded in
//! the [`TransformReport`], shown through the [`Notifier`], and does not fail
//! the task, so a watch session survives a bad edit. Lint gates and
//! filesystem errors (missing source directories, clean failures) do fail
//! the task.

pub mod clean;
pub mod copy;
pub mod image;
pub mod lint;
pub mod script;
pub mod style;
pub mod template;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::dag::{ScheduledTask, TaskAction};
use crate::engine::RuntimeEvent;
use crate::notifier::Notifier;
use crate::registry::PathRegistry;
use crate::serve::ReloadHub;
use crate::types::ReloadKind;

/// Everything a task action may touch. Shared read-only by all tasks.
pub struct TaskContext {
    pub config: ConfigFile,
    pub registry: PathRegistry,
    pub notifier: Arc<dyn Notifier>,
    pub reload: ReloadHub,
    pub runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("root", &self.registry.root())
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl TaskContext {
    pub fn root(&self) -> &Path {
        self.registry.root()
    }
}

/// A recoverable failure on one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    pub path: PathBuf,
    pub message: String,
}

/// Per-invocation result of a transform task.
#[derive(Debug, Clone, Default)]
pub struct TransformReport {
    /// Files written under the destination.
    pub written: Vec<PathBuf>,
    /// Inputs deliberately not processed (fragments, up-to-date pages).
    pub skipped: Vec<PathBuf>,
    pub errors: Vec<TransformError>,
}

impl TransformReport {
    pub fn record_error(&mut self, path: &Path, err: &anyhow::Error) {
        self.errors.push(TransformError {
            path: path.to_path_buf(),
            message: format!("{err:#}"),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Surface every recorded error through the notifier and log a summary.
    pub fn publish(&self, task: &str, notifier: &dyn Notifier) {
        for err in &self.errors {
            notifier.notify(
                &format!("{task}: {}", err.path.display()),
                &err.message,
            );
        }
        info!(
            task,
            written = self.written.len(),
            skipped = self.skipped.len(),
            errors = self.errors.len(),
            "transform finished"
        );
    }
}

/// Run the action of a scheduled task.
///
/// Returns the reload browsers should perform once the task succeeded.
/// `serve` only returns if it fails to start.
pub async fn run_action(ctx: &TaskContext, task: &ScheduledTask) -> Result<Option<ReloadKind>> {
    debug!(task = %task.name, run_id = task.run_id, "dispatching action");

    let (report, reload) = match task.action {
        TaskAction::Clean => {
            clean::run(ctx).await?;
            return Ok(None);
        }
        TaskAction::Style => (style::run(ctx).await?, Some(ReloadKind::Styles)),
        TaskAction::Template => (template::run(ctx).await?, Some(ReloadKind::Full)),
        TaskAction::ScriptBundle => (script::bundle(ctx).await?, Some(ReloadKind::Full)),
        TaskAction::VendorBundle => (script::vendor_bundle(ctx).await?, None),
        TaskAction::Image => (image::run(ctx).await?, None),
        TaskAction::Font => (copy::fonts(ctx).await?, None),
        TaskAction::VendorCopy => (copy::vendor_scripts(ctx).await?, None),
        TaskAction::LintStyle => {
            lint::style(ctx).await?;
            return Ok(None);
        }
        TaskAction::LintScript => {
            lint::script(ctx).await?;
            return Ok(None);
        }
        TaskAction::Serve => {
            crate::serve::start(ctx, task).await?;
            return Ok(None);
        }
        TaskAction::Aggregate => return Ok(None),
    };

    report.publish(&task.name, ctx.notifier.as_ref());
    Ok(reload)
}

/// True if any component of `relative` starts with `_` (a partial that is
/// only ever pulled in by other files).
pub fn is_fragment(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('_'))
}

/// Create the parent directory of `path` and write `contents` to it.
pub async fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
