// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetdag",
    version,
    about = "Build front-end assets through a task graph and serve them with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run (e.g. `build`, `sass`, `serve`).
    ///
    /// Several tasks given together form a single run. Defaults to `default`
    /// (build, then serve).
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// When omitted, `Assetdag.toml` in the current directory is used if it
    /// exists; otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the execution plan for the requested tasks without running them.
    #[arg(long)]
    pub dry_run: bool,

    /// Print every known task with its prerequisites and exit.
    #[arg(long)]
    pub list: bool,

    /// Override `[serve].port`.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Do not open a browser when serving.
    #[arg(long)]
    pub no_open: bool,
}

impl CliArgs {
    /// Requested task names, falling back to `default`.
    pub fn requested_tasks(&self) -> Vec<String> {
        if self.tasks.is_empty() {
            vec!["default".to_string()]
        } else {
            self.tasks.clone()
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
