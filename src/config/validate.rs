// src/config/validate.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AssetdagError, Result};
use crate::registry::resolve_category_paths;
use crate::types::AssetCategory;
use crate::watch::patterns::{PatternSet, glob_base};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_dirs(cfg)?;
    validate_category_paths(cfg)?;
    validate_lint_patterns(cfg)?;
    validate_commands(cfg)?;
    Ok(())
}

fn validate_dirs(cfg: &RawConfigFile) -> Result<()> {
    let src = cfg.dirs.src.trim();
    let dest = cfg.dirs.dest.trim();

    if src.is_empty() || dest.is_empty() {
        return Err(AssetdagError::ConfigError(
            "[dirs].src and [dirs].dest must not be empty".to_string(),
        ));
    }
    if Path::new(src) == Path::new(dest) {
        return Err(AssetdagError::ConfigError(format!(
            "[dirs].src and [dirs].dest must differ (both are '{src}')"
        )));
    }
    Ok(())
}

/// Compile every category's globs and make sure no category reads from the
/// output tree.
fn validate_category_paths(cfg: &RawConfigFile) -> Result<()> {
    let dest_root = Path::new(cfg.dirs.dest.trim());

    for category in AssetCategory::ALL {
        let paths = resolve_category_paths(&cfg.dirs, &cfg.paths, category);

        PatternSet::new(&paths.sources, &paths.exclude).map_err(|e| {
            AssetdagError::ConfigError(format!("[paths.{category}]: {e:#}"))
        })?;
        PatternSet::new(&paths.watch, &[]).map_err(|e| {
            AssetdagError::ConfigError(format!("[paths.{category}].watch: {e:#}"))
        })?;

        if paths.sources.is_empty() {
            return Err(AssetdagError::ConfigError(format!(
                "[paths.{category}].source must list at least one pattern"
            )));
        }

        for pattern in &paths.sources {
            if glob_base(pattern).starts_with(dest_root) {
                return Err(AssetdagError::ConfigError(format!(
                    "[paths.{category}] source '{pattern}' lies inside the output directory '{}'",
                    cfg.dirs.dest
                )));
            }
        }
    }

    Ok(())
}

fn validate_lint_patterns(cfg: &RawConfigFile) -> Result<()> {
    PatternSet::new(
        &cfg.style.effective_lint_source(&cfg.dirs),
        &cfg.style.effective_lint_exclude(&cfg.dirs),
    )
    .map_err(|e| AssetdagError::ConfigError(format!("[style] lint patterns: {e:#}")))?;

    PatternSet::new(
        &cfg.script.effective_lint_source(&cfg.dirs),
        &cfg.script.effective_lint_exclude(&cfg.dirs),
    )
    .map_err(|e| AssetdagError::ConfigError(format!("[script] lint patterns: {e:#}")))?;

    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    require_placeholders(
        "[script].bundle_command",
        &cfg.script.bundle_command,
        &["{entry}", "{output}"],
    )?;
    require_placeholders("[style].lint_command", &cfg.style.lint_command, &["{files}"])?;
    require_placeholders("[script].lint_command", &cfg.script.lint_command, &["{files}"])?;

    for (ext, cmd) in cfg.images.optimizers.iter() {
        require_placeholders(&format!("[images.optimizers].{ext}"), cmd, &["{output}"])?;
    }

    for (i, cmd) in cfg.style.postprocess.iter().enumerate() {
        if cmd.trim().is_empty() {
            return Err(AssetdagError::ConfigError(format!(
                "[style].postprocess[{i}] must not be empty"
            )));
        }
    }

    if cfg.script.vendor_output.trim().is_empty() || cfg.script.vendor_output.contains('/') {
        return Err(AssetdagError::ConfigError(format!(
            "[script].vendor_output must be a plain file name (got '{}')",
            cfg.script.vendor_output
        )));
    }

    Ok(())
}

fn require_placeholders(field: &str, template: &str, placeholders: &[&str]) -> Result<()> {
    for placeholder in placeholders {
        if !template.contains(placeholder) {
            return Err(AssetdagError::ConfigError(format!(
                "{field} must contain the {placeholder} placeholder (got '{template}')"
            )));
        }
    }
    Ok(())
}
