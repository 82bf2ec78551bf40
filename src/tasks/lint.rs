// src/tasks/lint.rs

//! Lint gates: run the configured linter once over the matching sources.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::errors::AssetdagError;
use crate::exec::{CommandLine, run_shell};
use crate::tasks::TaskContext;
use crate::watch::patterns::{PatternSet, collect_matching_files, glob_base, to_pattern_path};

/// Parameters of one linter invocation.
#[derive(Debug, Clone)]
pub struct LintJob<'a> {
    pub name: &'a str,
    pub command: &'a str,
    pub sources: Vec<String>,
    pub exclude: Vec<String>,
    pub fail_on_error: bool,
}

/// `lint-style`
pub async fn style(ctx: &TaskContext) -> Result<()> {
    let cfg = &ctx.config.style;
    run(
        ctx,
        LintJob {
            name: "lint-style",
            command: &cfg.lint_command,
            sources: cfg.effective_lint_source(&ctx.config.dirs),
            exclude: cfg.effective_lint_exclude(&ctx.config.dirs),
            fail_on_error: cfg.fail_on_error,
        },
    )
    .await
}

/// `lint-script`
pub async fn script(ctx: &TaskContext) -> Result<()> {
    let cfg = &ctx.config.script;
    run(
        ctx,
        LintJob {
            name: "lint-script",
            command: &cfg.lint_command,
            sources: cfg.effective_lint_source(&ctx.config.dirs),
            exclude: cfg.effective_lint_exclude(&ctx.config.dirs),
            fail_on_error: cfg.fail_on_error,
        },
    )
    .await
}

/// Run the linter with `{files}` bound to every matching file, relative to
/// the project root. Violations fail the task only with `fail_on_error`.
pub async fn run(ctx: &TaskContext, job: LintJob<'_>) -> Result<()> {
    let files = lint_files(ctx, &job)?;
    if files.is_empty() {
        info!(task = job.name, "no files to lint");
        return Ok(());
    }

    let line = CommandLine::new(job.command).paths("files", &files).render();
    let out = run_shell(&line, ctx.root()).await?;

    let output = out.combined();
    if !output.is_empty() {
        println!("{output}");
    }

    if out.success {
        info!(task = job.name, files = files.len(), "lint passed");
        return Ok(());
    }

    if job.fail_on_error {
        bail!("{} reported problems in {} file(s)", job.name, files.len());
    }
    warn!(task = job.name, "lint reported problems (not failing the build)");
    Ok(())
}

fn lint_files(ctx: &TaskContext, job: &LintJob<'_>) -> Result<Vec<PathBuf>> {
    let set = PatternSet::new(&job.sources, &job.exclude)?;
    let root = ctx.root();

    let bases: BTreeSet<PathBuf> = job.sources.iter().map(|p| glob_base(p)).collect();
    let mut files = BTreeSet::new();
    for base in bases {
        if !root.join(&base).is_dir() {
            return Err(AssetdagError::MissingSource(root.join(&base)).into());
        }
        for path in collect_matching_files(root, &base, &set, Some(ctx.registry.dest_root()))? {
            if let Ok(rel) = path.strip_prefix(root) {
                files.insert(PathBuf::from(to_pattern_path(rel)));
            }
        }
    }

    Ok(files.into_iter().collect())
}
