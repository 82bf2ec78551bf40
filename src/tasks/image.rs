// src/tasks/image.rs

//! `images`: copy each image into place, then optimise the copy with the
//! command configured for its extension.

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::exec::{CommandLine, run_shell};
use crate::tasks::copy::copy_file;
use crate::tasks::{TaskContext, TransformReport};
use crate::types::AssetCategory;

pub async fn run(ctx: &TaskContext) -> Result<TransformReport> {
    let files = ctx.registry.source_files(AssetCategory::Image)?;
    let dest_dir = ctx.registry.dest_dir(AssetCategory::Image);
    let optimizers = &ctx.config.images.optimizers;
    let mut report = TransformReport::default();

    for file in files {
        let target = dest_dir.join(&file.relative);
        if let Err(err) = copy_file(&file.path, &target).await {
            report.record_error(&file.path, &err);
            continue;
        }

        let ext = file
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if let Some(template) = optimizers.get(&ext) {
            let line = CommandLine::new(template)
                .path("input", &file.path)
                .path("output", &target)
                .render();
            match run_shell(&line, ctx.root()).await {
                Ok(out) if out.success => debug!(image = %target.display(), "optimised"),
                Ok(out) => report.record_error(
                    &file.path,
                    &anyhow!("optimiser failed, kept unoptimised copy:\n{}", out.combined()),
                ),
                Err(err) => report.record_error(&file.path, &err),
            }
        }

        report.written.push(target);
    }

    Ok(report)
}
