// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AssetdagError, Result};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "Assetdag.toml";

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        AssetdagError::ConfigError(format!("reading config file at {path:?}: {e}"))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration for a run.
///
/// - An explicitly named file must exist.
/// - Otherwise `Assetdag.toml` in the current directory is used when present,
///   and built-in defaults when it is not.
///
/// Returns the config plus the path it came from, if any.
pub fn load_optional(explicit: Option<&Path>) -> Result<(ConfigFile, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let cfg = load_and_validate(path)?;
        info!(config = ?path, "loaded configuration");
        return Ok((cfg, Some(path.to_path_buf())));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if path.is_file() {
        let cfg = load_and_validate(&path)?;
        info!(config = ?path, "loaded configuration");
        Ok((cfg, Some(path)))
    } else {
        debug!("no {DEFAULT_CONFIG_FILE} found; using built-in defaults");
        let cfg = ConfigFile::try_from(RawConfigFile::default())?;
        Ok((cfg, None))
    }
}
