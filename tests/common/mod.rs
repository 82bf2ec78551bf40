#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;

use assetdag::config::BuildSection;
use assetdag::dag::{Scheduler, TaskGraph};

pub use assetdag_test_utils::init_tracing;

pub type TestResult = Result<(), Box<dyn Error>>;

pub fn builtin_graph(quality_gate: bool) -> TaskGraph {
    TaskGraph::builtin(&BuildSection { quality_gate }).expect("builtin graph is valid")
}

pub fn builtin_scheduler(quality_gate: bool) -> Scheduler {
    Scheduler::new(Arc::new(builtin_graph(quality_gate)))
}

/// Sorted task names of a dispatch, for order-independent assertions.
pub fn names(tasks: &[assetdag::dag::ScheduledTask]) -> Vec<String> {
    let mut names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();
    names.sort();
    names
}
