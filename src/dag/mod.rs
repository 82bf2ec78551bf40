// src/dag/mod.rs

//! Task graph representation and scheduling.
//!
//! - [`graph`] holds the immutable task graph (hard `after` and soft
//!   `runs_after` edges) and the built-in pipeline.
//! - [`scheduler`] contains the per-run state machines that decide which
//!   tasks are ready to run.
//! - [`task_info`] provides run states and scheduled task types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::{TaskAction, TaskGraph, TaskSpec};
pub use scheduler::Scheduler;
pub use scheduler_step::{RunSummary, SchedulerStep};
pub use task_info::{ScheduledTask, TaskRunState};
