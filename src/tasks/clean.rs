// src/tasks/clean.rs

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::tasks::TaskContext;

/// Empty the output directory, keeping the directory itself.
pub async fn run(ctx: &TaskContext) -> Result<()> {
    let removed = empty_dir(ctx.registry.dest_root()).await?;
    info!(dir = %ctx.registry.dest_root().display(), removed, "output directory cleaned");
    Ok(())
}

/// Delete every entry inside `dir` without reading file contents.
///
/// A missing directory is a no-op. Returns the number of top-level entries
/// removed.
pub async fn empty_dir(dir: &Path) -> Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "nothing to clean");
            return Ok(0);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading {}", dir.display()));
        }
    };

    let mut removed = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("reading {}", dir.display()))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .with_context(|| format!("inspecting {}", path.display()))?;

        if file_type.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        }
        .with_context(|| format!("removing {}", path.display()))?;
        removed += 1;
    }

    Ok(removed)
}
