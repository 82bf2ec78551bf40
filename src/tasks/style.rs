// src/tasks/style.rs

//! `sass`: SCSS → CSS with `grass`, optional post-process filters and a
//! source map listing every stylesheet the entry loaded.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use serde_json::json;
use tracing::debug;

use crate::exec::run_filter;
use crate::registry::SourceFile;
use crate::tasks::{TaskContext, TransformReport, is_fragment, write_output};
use crate::types::{AssetCategory, OutputStyle};
use crate::watch::patterns::to_pattern_path;

/// A compiled stylesheet and the files read to produce it.
#[derive(Debug, Clone)]
pub struct CompiledStyle {
    pub css: String,
    /// The entry first, then every partial in load order.
    pub loaded: Vec<PathBuf>,
}

/// Real filesystem access that remembers which files the compiler read.
#[derive(Debug, Default)]
struct RecordingFs {
    loaded: Mutex<Vec<PathBuf>>,
}

impl grass::Fs for RecordingFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        let bytes = std::fs::read(path)?;
        if let Ok(mut loaded) = self.loaded.lock() {
            if !loaded.iter().any(|p| p == path) {
                loaded.push(path.to_path_buf());
            }
        }
        Ok(bytes)
    }
}

/// Compile one SCSS entry. Blocking; call from the blocking pool.
pub fn compile(entry: &Path, style: OutputStyle) -> Result<CompiledStyle> {
    let fs = RecordingFs::default();
    let grass_style = match style {
        OutputStyle::Compressed => grass::OutputStyle::Compressed,
        OutputStyle::Expanded => grass::OutputStyle::Expanded,
    };
    let options = grass::Options::default().style(grass_style).fs(&fs);

    let css = grass::from_path(entry, &options).map_err(|e| anyhow!("{e}"))?;
    drop(options);

    let loaded = fs.loaded.into_inner().unwrap_or_else(|p| p.into_inner());
    Ok(CompiledStyle { css, loaded })
}

/// Version 3 source map carrying sources and their contents.
///
/// `mappings` stays empty; the compiler does not expose segment mappings.
pub fn source_map(root: &Path, file: &str, loaded: &[PathBuf]) -> Result<String> {
    let mut sources = Vec::with_capacity(loaded.len());
    let mut contents = Vec::with_capacity(loaded.len());
    for path in loaded {
        let rel = path.strip_prefix(root).unwrap_or(path);
        sources.push(format!("/{}", to_pattern_path(rel)));
        contents.push(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading {} for source map", path.display()))?,
        );
    }

    let map = json!({
        "version": 3,
        "file": file,
        "sources": sources,
        "sourcesContent": contents,
        "names": [],
        "mappings": "",
    });
    Ok(map.to_string())
}

/// Compile every non-fragment stylesheet into the style destination.
pub async fn run(ctx: &TaskContext) -> Result<TransformReport> {
    let files = ctx.registry.source_files(AssetCategory::Style)?;
    let dest_dir = ctx.registry.dest_dir(AssetCategory::Style).to_path_buf();
    let mut report = TransformReport::default();

    for file in files {
        if is_fragment(&file.relative) {
            report.skipped.push(file.path);
            continue;
        }
        match build_one(ctx, &file, &dest_dir).await {
            Ok(written) => report.written.extend(written),
            Err(err) => report.record_error(&file.path, &err),
        }
    }

    Ok(report)
}

async fn build_one(ctx: &TaskContext, file: &SourceFile, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let style_cfg = &ctx.config.style;
    let entry = file.path.clone();
    let output_style = style_cfg.output_style;

    let compiled = tokio::task::spawn_blocking(move || compile(&entry, output_style))
        .await
        .context("style compiler task panicked")??;
    debug!(entry = %file.path.display(), loaded = compiled.loaded.len(), "compiled stylesheet");

    let mut css = compiled.css.into_bytes();
    for filter in &style_cfg.postprocess {
        css = run_filter(filter, ctx.root(), &css)
            .await
            .with_context(|| format!("post-processing {}", file.path.display()))?;
    }

    let css_path = dest_dir.join(file.relative.with_extension("css"));
    let css_name = css_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut written = Vec::new();

    if style_cfg.source_map {
        let map_name = format!("{css_name}.map");
        let map_path = css_path.with_file_name(&map_name);
        let loaded = if compiled.loaded.is_empty() {
            vec![file.path.clone()]
        } else {
            compiled.loaded
        };
        let map = source_map(ctx.root(), &css_name, &loaded)?;

        if !css.ends_with(b"\n") {
            css.push(b'\n');
        }
        css.extend_from_slice(format!("/*# sourceMappingURL={map_name} */\n").as_bytes());

        write_output(&map_path, map).await?;
        written.push(map_path);
    }

    write_output(&css_path, &css).await?;
    written.push(css_path);
    Ok(written)
}
