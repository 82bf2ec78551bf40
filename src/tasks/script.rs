// src/tasks/script.rs

//! Script tasks: per-entry bundling through an external bundler, and the
//! ordered vendor concatenation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::exec::{CommandLine, run_filter, run_shell};
use crate::tasks::{TaskContext, TransformReport, write_output};
use crate::types::AssetCategory;
use crate::watch::patterns::glob_base;

/// `bundle-js`: one bundle per top-level entry, named after the entry.
///
/// Entries are bundled concurrently. Anything under the vendor plugins
/// directory is never treated as an entry.
pub async fn bundle(ctx: &TaskContext) -> Result<TransformReport> {
    let files = ctx.registry.source_files(AssetCategory::Script)?;
    let dest_dir = ctx.registry.dest_dir(AssetCategory::Script).to_path_buf();
    let plugin_dirs: Vec<PathBuf> = ctx
        .registry
        .get(AssetCategory::VendorScript)
        .paths
        .sources
        .iter()
        .map(|p| ctx.root().join(glob_base(p)))
        .collect();
    let mut report = TransformReport::default();

    tokio::fs::create_dir_all(&dest_dir)
        .await
        .with_context(|| format!("creating directory {}", dest_dir.display()))?;

    let mut set = JoinSet::new();
    for file in files {
        if plugin_dirs.iter().any(|dir| file.path.starts_with(dir)) {
            report.skipped.push(file.path);
            continue;
        }

        let stem = file
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = dest_dir.join(format!("{stem}.js"));
        let line = CommandLine::new(&ctx.config.script.bundle_command)
            .path("entry", &file.path)
            .path("output", &output)
            .arg("name", &stem)
            .render();
        let root = ctx.root().to_path_buf();

        set.spawn(async move {
            let result = run_bundler(&line, &root).await;
            (file.path, output, result)
        });
    }

    while let Some(joined) = set.join_next().await {
        let (entry, output, result) = joined.context("bundler task panicked")?;
        match result {
            Ok(()) => report.written.push(output),
            Err(err) => report.record_error(&entry, &err),
        }
    }

    report.written.sort();
    Ok(report)
}

async fn run_bundler(line: &str, root: &Path) -> Result<()> {
    let out = run_shell(line, root).await?;
    if !out.success {
        return Err(anyhow!(
            "bundler exited with {}:\n{}",
            out.code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
            out.combined()
        ));
    }
    debug!(cmd = %line, "bundle written");
    Ok(())
}

/// `vendor-js`: concatenate the configured vendor files, in order, into one
/// minified file in the script destination.
///
/// Missing files are reported and skipped. If the minifier fails the
/// unminified concatenation is written instead.
pub async fn vendor_bundle(ctx: &TaskContext) -> Result<TransformReport> {
    let script = &ctx.config.script;
    let output = ctx
        .registry
        .dest_dir(AssetCategory::Script)
        .join(&script.vendor_output);
    let mut report = TransformReport::default();

    let mut parts = Vec::new();
    for rel in script.effective_vendor_files(&ctx.config.dirs) {
        let path = ctx.root().join(&rel);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => parts.push(text),
            Err(err) => {
                warn!(file = %path.display(), "vendor file unavailable; skipping");
                report.record_error(
                    &path,
                    &anyhow!(err).context("vendor file missing from bundle"),
                );
                report.skipped.push(path);
            }
        }
    }

    let joined = parts.join("\n");
    let contents = match script.minifier() {
        Some(minifier) => match run_filter(minifier, ctx.root(), joined.as_bytes()).await {
            Ok(min) => min,
            Err(err) => {
                report.record_error(&output, &err.context("minifier failed; writing unminified"));
                joined.into_bytes()
            }
        },
        None => joined.into_bytes(),
    };

    write_output(&output, contents).await?;
    report.written.push(output);
    Ok(report)
}
