// src/tasks/copy.rs

use std::path::Path;

use anyhow::{Context, Result};

use crate::tasks::{TaskContext, TransformReport};
use crate::types::AssetCategory;

/// `fonts`: copy font files unchanged.
pub async fn fonts(ctx: &TaskContext) -> Result<TransformReport> {
    copy_category(ctx, AssetCategory::Font).await
}

/// `js-vendor`: copy vendor scripts unchanged.
pub async fn vendor_scripts(ctx: &TaskContext) -> Result<TransformReport> {
    copy_category(ctx, AssetCategory::VendorScript).await
}

/// Copy every source of `category` to its destination, keeping the path
/// relative to the glob base.
pub async fn copy_category(ctx: &TaskContext, category: AssetCategory) -> Result<TransformReport> {
    let files = ctx.registry.source_files(category)?;
    let dest_dir = ctx.registry.dest_dir(category);
    let mut report = TransformReport::default();

    for file in files {
        let target = dest_dir.join(&file.relative);
        match copy_file(&file.path, &target).await {
            Ok(()) => report.written.push(target),
            Err(err) => report.record_error(&file.path, &err),
        }
    }

    Ok(report)
}

pub(crate) async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    tokio::fs::copy(from, to)
        .await
        .with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
    Ok(())
}
