// src/registry.rs

//! Path registry: the resolved source/exclude/watch globs and output
//! directory for every asset category.
//!
//! Built once at startup from the validated config and shared read-only by
//! every task action and the watcher.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, DirsSection, PathsSection};
use crate::errors::{AssetdagError, Result};
use crate::types::AssetCategory;
use crate::watch::patterns::{PatternSet, collect_matching_files, glob_base};

/// Globs and destination of one category, as strings relative to the
/// project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub sources: Vec<String>,
    pub exclude: Vec<String>,
    pub watch: Vec<String>,
    pub dest: String,
}

/// Apply the `[dirs]`-derived defaults to the `[paths.<category>]` overrides.
pub fn resolve_category_paths(
    dirs: &DirsSection,
    paths: &PathsSection,
    category: AssetCategory,
) -> ResolvedPaths {
    let src = dirs.src.trim().trim_end_matches('/');
    let dest = dirs.dest.trim().trim_end_matches('/');

    let (sources, exclude, watch, out) = match category {
        AssetCategory::Style => (
            vec![format!("{src}/css/*.scss")],
            vec![],
            Some(vec![format!("{src}/css/**/*.scss")]),
            format!("{dest}/css"),
        ),
        AssetCategory::Script => (
            vec![format!("{src}/js/*.js")],
            vec![format!("{src}/js/plugins/**")],
            Some(vec![format!("{src}/js/**/*.js")]),
            format!("{dest}/js"),
        ),
        AssetCategory::VendorScript => (
            vec![format!("{src}/js/plugins/*.js")],
            vec![],
            Some(vec![]),
            format!("{dest}/js/plugins"),
        ),
        AssetCategory::Template => (
            vec![format!("{src}/**/*.html")],
            vec![],
            None,
            dest.to_string(),
        ),
        AssetCategory::Image => (
            vec![format!("{src}/img/**/*.{{png,jpg,jpeg,gif,svg}}")],
            vec![],
            None,
            format!("{dest}/img"),
        ),
        AssetCategory::Font => (
            vec![format!("{src}/fonts/**/*")],
            vec![],
            Some(vec![format!("{src}/fonts/**/*.{{eot,woff,woff2}}")]),
            format!("{dest}/fonts"),
        ),
    };

    let overrides = paths.get(category);
    let sources = overrides.source.clone().unwrap_or(sources);
    let exclude = overrides.exclude.clone().unwrap_or(exclude);
    // A category without an explicit watch list watches its sources.
    let watch = overrides
        .watch
        .clone()
        .or(watch)
        .unwrap_or_else(|| sources.clone());
    let dest = overrides.dest.clone().unwrap_or(out);

    ResolvedPaths {
        sources,
        exclude,
        watch,
        dest,
    }
}

/// A source file found by [`PathRegistry::source_files`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the literal base of the glob that matched it.
    /// Outputs keep this layout under the category destination.
    pub relative: PathBuf,
}

/// One category with compiled patterns and absolute directories.
#[derive(Debug, Clone)]
pub struct CategoryEntry {
    pub paths: ResolvedPaths,
    pub sources: PatternSet,
    pub watch: PatternSet,
    /// Absolute destination directory.
    pub dest_dir: PathBuf,
}

/// Read-only lookup from [`AssetCategory`] to its resolved paths.
#[derive(Debug, Clone)]
pub struct PathRegistry {
    root: PathBuf,
    dest_root: PathBuf,
    src_root: PathBuf,
    categories: BTreeMap<AssetCategory, CategoryEntry>,
}

impl PathRegistry {
    pub fn from_config(root: impl Into<PathBuf>, cfg: &ConfigFile) -> Result<Self> {
        let root = root.into();
        let mut categories = BTreeMap::new();

        for category in AssetCategory::ALL {
            let paths = resolve_category_paths(&cfg.dirs, &cfg.paths, category);
            let sources = PatternSet::new(&paths.sources, &paths.exclude).map_err(|e| {
                AssetdagError::ConfigError(format!("[paths.{category}]: {e:#}"))
            })?;
            let watch = PatternSet::new(&paths.watch, &[]).map_err(|e| {
                AssetdagError::ConfigError(format!("[paths.{category}].watch: {e:#}"))
            })?;
            let dest_dir = root.join(&paths.dest);

            categories.insert(
                category,
                CategoryEntry {
                    paths,
                    sources,
                    watch,
                    dest_dir,
                },
            );
        }

        Ok(Self {
            dest_root: root.join(cfg.dirs.dest.trim()),
            src_root: root.join(cfg.dirs.src.trim()),
            root,
            categories,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute `[dirs].dest`.
    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Absolute `[dirs].src`.
    pub fn src_root(&self) -> &Path {
        &self.src_root
    }

    pub fn get(&self, category: AssetCategory) -> &CategoryEntry {
        // Every category is inserted by `from_config`.
        &self.categories[&category]
    }

    pub fn dest_dir(&self, category: AssetCategory) -> &Path {
        &self.get(category).dest_dir
    }

    /// Files currently matching the category's sources, sorted and
    /// de-duplicated. Fails with [`AssetdagError::MissingSource`] when the
    /// base directory of a source glob does not exist.
    pub fn source_files(&self, category: AssetCategory) -> Result<Vec<SourceFile>> {
        let entry = self.get(category);
        let mut files = Vec::new();

        for pattern in &entry.paths.sources {
            let base = glob_base(pattern);
            let base_dir = self.root.join(&base);
            if !base_dir.is_dir() {
                return Err(AssetdagError::MissingSource(base_dir));
            }

            let single = PatternSet::new(std::slice::from_ref(pattern), &entry.paths.exclude)?;
            for path in collect_matching_files(&self.root, &base, &single, Some(&self.dest_root))?
            {
                let relative = path
                    .strip_prefix(&base_dir)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));
                files.push(SourceFile { path, relative });
            }
        }

        files.sort();
        files.dedup_by(|a, b| a.path == b.path);
        Ok(files)
    }
}
