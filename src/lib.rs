// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod notifier;
pub mod registry;
pub mod serve;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_optional};
use crate::dag::TaskGraph;
use crate::engine::{
    CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, RuntimeReport, TaskName, TriggerReason,
};
use crate::errors::{AssetdagError, Result};
use crate::exec::RealExecutorBackend;
use crate::notifier::{ConsoleNotifier, Notifier};
use crate::registry::PathRegistry;
use crate::serve::ReloadHub;
use crate::tasks::TaskContext;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - task graph construction and task name resolution
/// - `--list` / `--dry-run` diagnostics
/// - the runtime for the requested tasks
pub async fn run(args: CliArgs) -> Result<()> {
    let (mut cfg, cfg_path) = load_optional(args.config.as_deref().map(Path::new))?;
    let root = project_root(cfg_path.as_deref());

    if let Some(port) = args.port {
        cfg.serve.port = port;
    }
    if args.no_open {
        cfg.serve.open = false;
    }

    let graph = TaskGraph::builtin(&cfg.build)?;

    if args.list {
        print_task_list(&graph);
        return Ok(());
    }

    let tasks = resolve_tasks(&graph, &args.requested_tasks())?;

    if args.dry_run {
        print_dry_run(&graph, &tasks, &cfg, &root);
        return Ok(());
    }

    let report = execute(root, cfg, graph, tasks, Arc::new(ConsoleNotifier)).await?;

    let failed = report.failed_manual_tasks();
    if !failed.is_empty() {
        return Err(AssetdagError::TaskFailed(failed.join(", ")));
    }
    Ok(())
}

/// Run `tasks` (already resolved) as one manual run with the real executor.
///
/// Returns once the run finished, unless `serve` is part of it; then the
/// runtime keeps handling watch-triggered runs until Ctrl-C.
pub async fn execute(
    root: PathBuf,
    cfg: ConfigFile,
    graph: TaskGraph,
    tasks: Vec<TaskName>,
    notifier: Arc<dyn Notifier>,
) -> Result<RuntimeReport> {
    let root = root.canonicalize().unwrap_or(root);
    let registry = PathRegistry::from_config(&root, &cfg)?;
    let exit_when_idle = !graph.closure(&tasks).contains("serve");
    let behaviour = cfg.watch.triggered_while_running_behaviour;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let reload = ReloadHub::new();

    let ctx = Arc::new(TaskContext {
        config: cfg,
        registry,
        notifier,
        reload: reload.clone(),
        runtime_tx: rt_tx.clone(),
    });
    let executor = RealExecutorBackend::new(ctx);

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(?tasks, root = %root.display(), "starting invocation");
    rt_tx
        .send(RuntimeEvent::TaskTriggered {
            tasks,
            reason: TriggerReason::Manual,
            reload: None,
        })
        .await
        .map_err(errors::Error::from)?;

    let scheduler = dag::Scheduler::new(Arc::new(graph));
    let core = CoreRuntime::new(scheduler, behaviour, RuntimeOptions { exit_when_idle });
    let runtime = Runtime::new(core, rt_rx, executor, reload);
    runtime.run().await
}

/// Resolve task names and aliases; unknown names are an error.
pub fn resolve_tasks(graph: &TaskGraph, requested: &[String]) -> Result<Vec<TaskName>> {
    let mut out: Vec<TaskName> = Vec::new();
    for name in requested {
        let resolved = graph.resolve(name)?;
        if !out.contains(&resolved) {
            out.push(resolved);
        }
    }
    Ok(out)
}

/// The directory containing the config file, or the current directory.
///
/// A bare filename like "Assetdag.toml" (parent = "") also means the current
/// directory.
fn project_root(config_path: Option<&Path>) -> PathBuf {
    match config_path.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// `--list`: every task with its prerequisites, then the aliases.
fn print_task_list(graph: &TaskGraph) {
    println!("tasks:");
    for name in graph.tasks() {
        let Some(spec) = graph.spec(name) else {
            continue;
        };
        print!("  {name:<12} {}", spec.action);
        if !spec.after.is_empty() {
            print!("  (after: {})", spec.after.join(", "));
        }
        if !spec.runs_after.is_empty() {
            print!("  (runs after: {})", spec.runs_after.join(", "));
        }
        println!();
    }

    println!();
    println!("aliases:");
    for (alias, target) in graph.aliases() {
        println!("  {alias:<12} -> {target}");
    }
}

/// `--dry-run`: the execution order of the requested tasks and the paths
/// they touch.
fn print_dry_run(graph: &TaskGraph, tasks: &[TaskName], cfg: &ConfigFile, root: &Path) {
    println!("assetdag dry-run");
    println!("  root = {}", root.display());
    println!("  requested = {}", tasks.join(", "));
    println!(
        "  watch.triggered_while_running_behaviour = {:?}",
        cfg.watch.triggered_while_running_behaviour
    );
    println!();

    let plan = graph.execution_plan(tasks);
    println!("plan ({} tasks):", plan.len());
    for (idx, name) in plan.iter().enumerate() {
        let action = graph
            .spec(name)
            .map(|s| s.action.to_string())
            .unwrap_or_default();
        println!("  {:>2}. {name} ({action})", idx + 1);
    }

    for category in types::AssetCategory::ALL {
        let paths = registry::resolve_category_paths(&cfg.dirs, &cfg.paths, category);
        println!();
        println!("[{category}]");
        println!("  source: {:?}", paths.sources);
        if !paths.exclude.is_empty() {
            println!("  exclude: {:?}", paths.exclude);
        }
        if !paths.watch.is_empty() {
            println!("  watch: {:?}", paths.watch);
        }
        println!("  dest: {}", paths.dest);
    }

    debug!("dry-run complete (no execution)");
}
