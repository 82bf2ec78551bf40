// src/watch/patterns.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Compiled include/exclude glob patterns.
///
/// Patterns are relative to the project root and matched against relative
/// paths with forward slashes (e.g. `"src/css/a.scss"`). `*` never crosses a
/// directory separator; use `**` for that.
#[derive(Clone)]
pub struct PatternSet {
    include: GlobSet,
    exclude: Option<GlobSet>,
    patterns: Vec<String>,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl PatternSet {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include_set = build_globset(include).context("building include globset")?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        Ok(Self {
            include: include_set,
            exclude: exclude_set,
            patterns: include.to_vec(),
        })
    }

    /// The include patterns this set was built from.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if `rel_path` (relative to project root) is included and
    /// not excluded.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Literal directory prefix of a glob, i.e. everything before the first
/// component containing a glob metacharacter.
///
/// `src/css/*.scss` → `src/css`, `src/**/*.html` → `src`. A pattern without
/// metacharacters names a single file; its base is the parent directory.
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let mut saw_meta = false;

    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(['*', '?', '[', '{']) {
            saw_meta = true;
            break;
        }
        base.push(component);
    }

    if !saw_meta {
        base.pop();
    }
    base
}

/// Convert a relative path into the forward-slash form patterns match against.
pub fn to_pattern_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Collect all files under `root.join(base)` whose root-relative path matches
/// `set`. Directories equal to `skip_dir` (the output tree) are not entered.
///
/// Results are sorted for deterministic processing order.
pub fn collect_matching_files(
    root: &Path,
    base: &Path,
    set: &PatternSet,
    skip_dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.join(base)];

    while let Some(dir) = stack.pop() {
        if skip_dir.is_some_and(|skip| dir == skip) {
            continue;
        }
        let entries =
            std::fs::read_dir(&dir).with_context(|| format!("reading dir {dir:?}"))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                if let Ok(rel) = path.strip_prefix(root) {
                    if set.matches(&to_pattern_path(rel)) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}
