// src/exec/mod.rs

//! Execution layer.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.
//! - [`executor_loop`] owns the loop that runs task actions and reports
//!   `TaskCompleted` back to the runtime.
//! - [`command`] renders and runs external tool command templates.

pub mod backend;
pub mod command;
pub mod executor_loop;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use command::{CommandLine, CommandOutput, run_filter, run_shell, shell_quote};
pub use executor_loop::spawn_executor;
