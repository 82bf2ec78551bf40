// src/watch/bindings.rs

//! Watch bindings: which task runs when files in which category change.

use crate::engine::TaskName;
use crate::registry::PathRegistry;
use crate::types::{AssetCategory, ReloadKind};
use crate::watch::patterns::PatternSet;

/// A compiled watch pattern set bound to a task.
///
/// `reload` is the notification pushed to browsers once the bound task
/// finished successfully. Tasks that broadcast their own reload (`sass`,
/// `pug`, `bundle-js`) leave it empty.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    pub patterns: PatternSet,
    pub task: TaskName,
    pub reload: Option<ReloadKind>,
}

impl WatchBinding {
    pub fn matches(&self, rel_path: &str) -> bool {
        self.patterns.matches(rel_path)
    }
}

/// The bindings installed by `serve`.
pub fn build_bindings(registry: &PathRegistry) -> Vec<WatchBinding> {
    let table = [
        (AssetCategory::Style, "sass", None),
        (AssetCategory::Script, "bundle-js", None),
        (AssetCategory::Template, "pug", None),
        (AssetCategory::Image, "images", Some(ReloadKind::Full)),
        (AssetCategory::Font, "fonts", Some(ReloadKind::Full)),
    ];

    table
        .into_iter()
        .filter(|(category, _, _)| !registry.get(*category).paths.watch.is_empty())
        .map(|(category, task, reload)| WatchBinding {
            patterns: registry.get(category).watch.clone(),
            task: task.to_string(),
            reload,
        })
        .collect()
}

/// Indices of the bindings matching any of `rel_paths`, each at most once,
/// in binding order.
pub fn matching_bindings<'a, I>(bindings: &[WatchBinding], rel_paths: I) -> Vec<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hit = vec![false; bindings.len()];
    for rel in rel_paths {
        for (idx, binding) in bindings.iter().enumerate() {
            if !hit[idx] && binding.matches(rel) {
                hit[idx] = true;
            }
        }
    }
    hit.iter()
        .enumerate()
        .filter_map(|(idx, h)| h.then_some(idx))
        .collect()
}
