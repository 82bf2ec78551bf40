// src/tasks/template.rs

//! `pug`: render HTML templates with `minijinja`, rebuilding only pages
//! whose output is older than the page or anything it transitively
//! includes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, context, path_loader};
use regex::Regex;
use tracing::debug;

use crate::tasks::{TaskContext, TransformReport, is_fragment, write_output};
use crate::types::AssetCategory;
use crate::watch::patterns::to_pattern_path;

const REFERENCE_PATTERN: &str = r#"\{%-?\s*(?:include|extends|import|from)\s+["']([^"']+)["']"#;

/// Template names referenced by `include`, `extends`, `import` and `from`.
pub fn references(source: &str) -> Result<Vec<String>> {
    Ok(extract_references(&reference_regex()?, source))
}

fn reference_regex() -> Result<Regex> {
    Regex::new(REFERENCE_PATTERN).context("compiling template reference pattern")
}

fn extract_references(re: &Regex, source: &str) -> Vec<String> {
    re.captures_iter(source)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Include/extends relations between templates under one loader root.
#[derive(Debug, Clone, Default)]
pub struct TemplateGraph {
    edges: BTreeMap<PathBuf, Vec<PathBuf>>,
    unreadable: BTreeMap<PathBuf, String>,
}

impl TemplateGraph {
    /// Read `templates` and everything they reference, recording edges.
    /// Referenced names that do not exist on disk are left out. A template
    /// that cannot be read as UTF-8 gets no edges and is listed by
    /// [`TemplateGraph::unreadable`].
    pub fn scan(loader_root: &Path, templates: &[PathBuf]) -> Result<Self> {
        let re = reference_regex()?;
        let mut edges = BTreeMap::new();
        let mut unreadable = BTreeMap::new();
        let mut queue: Vec<PathBuf> = templates.to_vec();

        while let Some(path) = queue.pop() {
            if edges.contains_key(&path) {
                continue;
            }
            let source = match std::fs::read_to_string(&path) {
                Ok(source) => source,
                Err(err) => {
                    debug!(template = %path.display(), error = %err, "template unreadable");
                    unreadable.insert(path.clone(), format!("reading template: {err}"));
                    edges.insert(path, Vec::new());
                    continue;
                }
            };

            let targets: Vec<PathBuf> = extract_references(&re, &source)
                .into_iter()
                .map(|name| loader_root.join(name))
                .filter(|target| target.is_file())
                .collect();
            queue.extend(targets.iter().cloned());
            edges.insert(path, targets);
        }

        Ok(Self { edges, unreadable })
    }

    /// Templates whose contents could not be read, with the reason.
    pub fn unreadable(&self) -> &BTreeMap<PathBuf, String> {
        &self.unreadable
    }

    /// `page` plus every template it transitively references.
    pub fn closure(&self, page: &Path) -> BTreeSet<PathBuf> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![page.to_path_buf()];
        while let Some(path) = stack.pop() {
            if let Some(targets) = self.edges.get(&path) {
                stack.extend(targets.iter().filter(|t| !seen.contains(*t)).cloned());
            }
            seen.insert(path);
        }
        seen
    }

    /// Whether `output` is missing or not newer than every member of the
    /// closure of `page`. Equal mtimes count as stale.
    pub fn is_stale(&self, page: &Path, output: &Path) -> bool {
        let Some(built) = modified(output) else {
            return true;
        };
        self.closure(page)
            .iter()
            .filter_map(|p| modified(p))
            .any(|input| input >= built)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// A page selected for rendering.
struct PageJob {
    source: PathBuf,
    name: String,
    output: PathBuf,
}

/// Render every stale, non-fragment page into the template destination.
pub async fn run(ctx: &TaskContext) -> Result<TransformReport> {
    let files = ctx.registry.source_files(AssetCategory::Template)?;
    let dest_dir = ctx.registry.dest_dir(AssetCategory::Template).to_path_buf();
    let loader_root = ctx.registry.src_root().to_path_buf();
    let mut report = TransformReport::default();

    let all: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
    let graph = {
        let loader_root = loader_root.clone();
        tokio::task::spawn_blocking(move || TemplateGraph::scan(&loader_root, &all))
            .await
            .context("template scan task panicked")??
    };

    for (path, reason) in graph.unreadable() {
        report.record_error(path, &anyhow!("{reason}"));
    }

    let mut jobs = Vec::new();
    for file in files {
        if graph.unreadable().contains_key(&file.path) {
            continue;
        }
        if is_fragment(&file.relative) {
            report.skipped.push(file.path);
            continue;
        }
        let output = dest_dir.join(&file.relative);
        if !graph.is_stale(&file.path, &output) {
            debug!(page = %file.path.display(), "output up to date");
            report.skipped.push(file.path);
            continue;
        }
        match file.path.strip_prefix(&loader_root) {
            Ok(rel) => jobs.push(PageJob {
                name: to_pattern_path(rel),
                source: file.path.clone(),
                output,
            }),
            Err(_) => report.record_error(
                &file.path,
                &anyhow!("template lies outside {}", loader_root.display()),
            ),
        }
    }

    let rendered = tokio::task::spawn_blocking(move || render_pages(&loader_root, jobs))
        .await
        .context("template render task panicked")?;

    for (job, result) in rendered {
        match result {
            Ok(html) => match write_output(&job.output, html).await {
                Ok(()) => report.written.push(job.output),
                Err(err) => report.record_error(&job.source, &err),
            },
            Err(err) => report.record_error(&job.source, &err),
        }
    }

    Ok(report)
}

fn render_pages(loader_root: &Path, jobs: Vec<PageJob>) -> Vec<(PageJob, Result<String>)> {
    let mut env = Environment::new();
    env.set_loader(path_loader(loader_root));

    jobs.into_iter()
        .map(|job| {
            let result = env
                .get_template(&job.name)
                .and_then(|tmpl| tmpl.render(context! { page => job.name.as_str() }))
                .map_err(|e| anyhow!("{e:#}"));
            (job, result)
        })
        .collect()
}
