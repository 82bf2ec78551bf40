use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use proptest::prelude::*;

use assetdag::dag::{Scheduler, TaskAction, TaskGraph, TaskSpec};
use assetdag::engine::{TaskOutcome, TriggerReason};

/// A graph where task `i` may only depend on tasks `< i`, so it is always
/// acyclic. Each edge is hard or soft at random.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = TaskGraph> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec((any::<usize>(), any::<bool>()), 0..num_tasks),
            num_tasks,
        )
        .prop_map(move |raw_deps| {
            let names: Vec<String> = (0..num_tasks).map(|i| format!("task_{i}")).collect();
            let specs = raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, deps)| {
                    let mut hard = BTreeSet::new();
                    let mut soft = BTreeSet::new();
                    if i > 0 {
                        for (dep, is_hard) in deps {
                            let dep = dep % i;
                            if is_hard {
                                hard.insert(dep);
                            } else {
                                soft.insert(dep);
                            }
                        }
                    }
                    soft.retain(|d| !hard.contains(d));

                    let hard: Vec<&str> = hard.iter().map(|&d| names[d].as_str()).collect();
                    let soft: Vec<&str> = soft.iter().map(|&d| names[d].as_str()).collect();
                    TaskSpec::new(&names[i], TaskAction::Aggregate)
                        .after(&hard)
                        .runs_after(&soft)
                })
                .collect();
            TaskGraph::from_specs(specs).expect("generated graph is acyclic")
        })
    })
}

proptest! {
    #[test]
    fn every_run_terminates_and_respects_ordering(
        graph in dag_strategy(10),
        roots in proptest::collection::vec(0..10usize, 1..4),
        failing in proptest::collection::vec(0..10usize, 0..4),
    ) {
        let names: Vec<String> = graph.tasks().map(str::to_string).collect();
        let roots: Vec<String> = roots.iter().filter(|&&i| i < names.len()).map(|&i| names[i].clone()).collect();
        let failing: HashSet<String> = failing.iter().filter(|&&i| i < names.len()).map(|&i| names[i].clone()).collect();
        let members = graph.closure(&roots);

        let graph = Arc::new(graph);
        let mut scheduler = Scheduler::new(Arc::clone(&graph));

        let step = scheduler.start_run(&roots, TriggerReason::Manual, None);
        let run_id = step.run_id;
        let mut executing: Vec<String> = step.newly_scheduled.into_iter().map(|t| t.name).collect();
        let mut finished = step.finished;
        let mut completed: Vec<String> = Vec::new();

        let mut steps = 0;
        while let Some(task) = executing.pop() {
            steps += 1;
            prop_assert!(steps <= 1000, "scheduler did not terminate");

            // Every hard prerequisite and every in-run soft one already ran.
            for dep in graph.dependencies_of(&task) {
                prop_assert!(completed.contains(dep), "{task} ran before {dep}");
            }
            for dep in graph.soft_dependencies_of(&task) {
                if members.contains(dep) {
                    prop_assert!(completed.contains(dep), "{task} ran before soft {dep}");
                }
            }

            let outcome = if failing.contains(&task) {
                TaskOutcome::Failed("injected".into())
            } else {
                TaskOutcome::Success
            };
            let ok = outcome == TaskOutcome::Success;
            let step = scheduler.handle_completion(run_id, &task, outcome);
            if ok {
                completed.push(task);
            }
            executing.extend(step.newly_scheduled.into_iter().map(|t| t.name));
            if step.finished.is_some() {
                finished = step.finished;
            }
        }

        let summary = finished.expect("run finished");
        prop_assert!(scheduler.is_idle());

        let accounted: BTreeSet<String> = summary.succeeded.iter().chain(summary.failed.iter()).cloned().collect();
        prop_assert_eq!(accounted, members);
        prop_assert_eq!(summary.is_success(), summary.failed.is_empty());
        for task in &summary.failed {
            prop_assert!(!completed.contains(task));
        }
    }
}
