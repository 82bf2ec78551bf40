// src/serve/mod.rs

//! The `serve` task: HTTP server over the output directory, live reload, and
//! the file watcher that re-runs tasks on change.
//!
//! States: `Starting` until the server is bound, the watch subscriptions
//! exist and the browser was (optionally) opened; then `Serving`, at which
//! point the task reports progress so its run can finish. There is no
//! terminal state; the process ends on Ctrl-C.

pub mod reload;
pub mod server;

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::tasks::TaskContext;
use crate::watch::{WatchSetup, build_bindings, spawn_watcher};

pub use reload::ReloadHub;
pub use server::{CLIENT_PATH, LIVERELOAD_PATH, RunningServer, inject_client, router};

/// Lifecycle of the `serve` task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeState {
    Starting,
    Serving,
}

/// Run the `serve` task. Only returns on failure.
pub async fn start(ctx: &TaskContext, task: &ScheduledTask) -> Result<()> {
    let mut state = ServeState::Starting;
    let serve = &ctx.config.serve;
    info!(task = %task.name, ?state, "starting dev server");

    let server = RunningServer::bind(
        &serve.host,
        serve.port,
        ctx.registry.dest_root().to_path_buf(),
        ctx.reload.clone(),
    )
    .await?;

    let setup = WatchSetup {
        root: ctx.root().to_path_buf(),
        dest_root: ctx.registry.dest_root().to_path_buf(),
        bindings: build_bindings(&ctx.registry),
        debounce: Duration::from_millis(ctx.config.watch.debounce_ms),
    };
    let watcher = match spawn_watcher(setup, ctx.runtime_tx.clone()) {
        Ok(w) => w,
        Err(err) => {
            server.abort();
            return Err(err.context("starting file watcher"));
        }
    };

    let url = server.url();
    if serve.open {
        open_browser(&url);
    }

    state = ServeState::Serving;
    info!(task = %task.name, ?state, %url, "serving");

    ctx.runtime_tx
        .send(RuntimeEvent::TaskProgressed {
            run_id: task.run_id,
            task: task.name.clone(),
        })
        .await
        .context("reporting serve progress")?;

    let result = server.wait().await;
    drop(watcher);
    result
}

/// Ask the platform to open `url` in the default browser. Failure is only
/// logged.
fn open_browser(url: &str) {
    let mut cmd = if cfg!(target_os = "macos") {
        tokio::process::Command::new("open")
    } else if cfg!(windows) {
        let mut c = tokio::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        tokio::process::Command::new("xdg-open")
    };
    cmd.arg(url)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());

    match cmd.spawn() {
        Ok(_child) => info!(%url, "opened browser"),
        Err(err) => warn!(%url, error = %err, "could not open browser"),
    }
}
