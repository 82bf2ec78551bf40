// src/config/mod.rs

//! Configuration loading and validation for assetdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to defaults (`loader.rs`).
//! - Validate globs, command templates and the src/dest layout (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path, load_optional};
pub use model::{
    BuildSection, CategoryPaths, ConfigFile, DirsSection, ImagesSection, PathsSection,
    RawConfigFile, ScriptSection, ServeSection, StyleSection, WatchSection,
};
