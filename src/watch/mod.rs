// src/watch/mod.rs

//! File watching and change dispatch.
//!
//! This module is responsible for:
//! - Compiling glob patterns with `/`-aware semantics (`patterns`).
//! - Binding watch pattern sets to tasks (`bindings`).
//! - Wiring up a cross-platform filesystem watcher (`notify`) and a single
//!   dispatcher that turns change events into task triggers (`watcher`),
//!   optionally debounced (`debounce`).
//!
//! It does **not** know about the DAG; it only turns filesystem changes into
//! task-level triggers.

pub mod bindings;
pub mod debounce;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use bindings::{WatchBinding, build_bindings, matching_bindings};
pub use debounce::Debouncer;
pub use patterns::{PatternSet, collect_matching_files, glob_base};
pub use watcher::{WatchSetup, WatcherHandle, spawn_watcher};
