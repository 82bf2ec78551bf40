// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::BuildSection;
use crate::engine::TaskName;
use crate::errors::{AssetdagError, Result};

/// What a task does when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskAction {
    Clean,
    Style,
    Template,
    ScriptBundle,
    VendorBundle,
    Image,
    Font,
    VendorCopy,
    LintStyle,
    LintScript,
    Serve,
    /// Does nothing itself; completes once its prerequisites have.
    Aggregate,
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskAction::Clean => "clean output directory",
            TaskAction::Style => "compile stylesheets",
            TaskAction::Template => "render templates",
            TaskAction::ScriptBundle => "bundle scripts",
            TaskAction::VendorBundle => "concatenate vendor scripts",
            TaskAction::Image => "optimise images",
            TaskAction::Font => "copy fonts",
            TaskAction::VendorCopy => "copy vendor scripts",
            TaskAction::LintStyle => "lint stylesheets",
            TaskAction::LintScript => "lint scripts",
            TaskAction::Serve => "serve and watch",
            TaskAction::Aggregate => "aggregate",
        };
        f.write_str(s)
    }
}

/// Static description of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: TaskName,
    pub action: TaskAction,
    /// Hard prerequisites: pulled into every run of this task and must
    /// succeed first.
    pub after: Vec<TaskName>,
    /// Soft ordering: only waited for when also part of the same run.
    pub runs_after: Vec<TaskName>,
}

impl TaskSpec {
    pub fn new(name: &str, action: TaskAction) -> Self {
        Self {
            name: name.to_string(),
            action,
            after: Vec::new(),
            runs_after: Vec::new(),
        }
    }

    pub fn after(mut self, deps: &[&str]) -> Self {
        self.after.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn runs_after(mut self, deps: &[&str]) -> Self {
        self.runs_after.extend(deps.iter().map(|d| d.to_string()));
        self
    }
}

/// Internal node structure: the `TaskSpec` plus immediate dependents over both
/// edge kinds.
#[derive(Debug, Clone)]
struct DagNode {
    spec: TaskSpec,
    dependents: Vec<TaskName>,
}

/// Immutable task graph, validated acyclic on construction.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: BTreeMap<TaskName, DagNode>,
    aliases: BTreeMap<String, TaskName>,
}

impl TaskGraph {
    /// The built-in asset pipeline.
    ///
    /// With `quality_gate` both linters become prerequisites of `build`.
    pub fn builtin(build: &BuildSection) -> Result<Self> {
        let mut build_deps = vec!["pug", "sass", "bundle-js", "images", "fonts"];
        if build.quality_gate {
            build_deps.extend(["lint-style", "lint-script"]);
        }

        let specs = vec![
            TaskSpec::new("clean", TaskAction::Clean),
            TaskSpec::new("sass", TaskAction::Style),
            TaskSpec::new("lint-style", TaskAction::LintStyle),
            TaskSpec::new("lint-script", TaskAction::LintScript),
            TaskSpec::new("pug", TaskAction::Template),
            TaskSpec::new("vendor-js", TaskAction::VendorBundle),
            TaskSpec::new("bundle-js", TaskAction::ScriptBundle).after(&["vendor-js"]),
            TaskSpec::new("images", TaskAction::Image),
            TaskSpec::new("fonts", TaskAction::Font),
            TaskSpec::new("js-vendor", TaskAction::VendorCopy),
            TaskSpec::new("serve", TaskAction::Serve).runs_after(&["build"]),
            TaskSpec::new("build", TaskAction::Aggregate).after(&build_deps),
            TaskSpec::new("default", TaskAction::Aggregate).after(&["build", "serve"]),
        ];

        let mut graph = Self::from_specs(specs)?;
        for (alias, target) in [
            ("styles", "sass"),
            ("templates", "pug"),
            ("scss-lint", "lint-style"),
            ("eslint", "lint-script"),
        ] {
            graph.add_alias(alias, target)?;
        }
        Ok(graph)
    }

    /// Build and validate a graph from arbitrary specs.
    ///
    /// Rejects duplicate names, unknown or self references, and cycles over
    /// hard and soft edges combined.
    pub fn from_specs(specs: Vec<TaskSpec>) -> Result<Self> {
        let mut nodes: BTreeMap<TaskName, DagNode> = BTreeMap::new();

        for spec in specs {
            let name = spec.name.clone();
            let previous = nodes.insert(
                name.clone(),
                DagNode {
                    spec,
                    dependents: Vec::new(),
                },
            );
            if previous.is_some() {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{name}' is defined twice"
                )));
            }
        }

        // Second pass: validate references and populate dependents.
        let edges: Vec<(TaskName, TaskName)> = nodes
            .values()
            .flat_map(|n| {
                n.spec
                    .after
                    .iter()
                    .chain(n.spec.runs_after.iter())
                    .map(|dep| (dep.clone(), n.spec.name.clone()))
            })
            .collect();

        for (dep, task) in &edges {
            if dep == task {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{task}' cannot depend on itself"
                )));
            }
            match nodes.get_mut(dep) {
                Some(dep_node) => {
                    if !dep_node.dependents.contains(task) {
                        dep_node.dependents.push(task.clone());
                    }
                }
                None => {
                    return Err(AssetdagError::ConfigError(format!(
                        "task '{task}' has unknown dependency '{dep}'"
                    )));
                }
            }
        }

        // Edge direction: dep -> task. A topological sort fails on a cycle.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (dep, task) in &edges {
            graph.add_edge(dep.as_str(), task.as_str(), ());
        }
        if let Err(cycle) = toposort(&graph, None) {
            return Err(AssetdagError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                cycle.node_id()
            )));
        }

        Ok(Self {
            nodes,
            aliases: BTreeMap::new(),
        })
    }

    pub fn add_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        if !self.nodes.contains_key(target) {
            return Err(AssetdagError::TaskNotFound(target.to_string()));
        }
        if self.nodes.contains_key(alias) {
            return Err(AssetdagError::ConfigError(format!(
                "alias '{alias}' shadows a task of the same name"
            )));
        }
        self.aliases.insert(alias.to_string(), target.to_string());
        Ok(())
    }

    /// Canonical task name for a task name or alias.
    pub fn resolve(&self, name: &str) -> Result<TaskName> {
        if self.nodes.contains_key(name) {
            return Ok(name.to_string());
        }
        self.aliases
            .get(name)
            .cloned()
            .ok_or_else(|| AssetdagError::TaskNotFound(name.to_string()))
    }

    /// Return all task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn spec(&self, name: &str) -> Option<&TaskSpec> {
        self.nodes.get(name).map(|n| &n.spec)
    }

    /// Hard prerequisites of a task (its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.spec.after.as_slice())
            .unwrap_or(&[])
    }

    /// Soft ordering constraints of a task (its `runs_after`).
    pub fn soft_dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.spec.runs_after.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents over both edge kinds.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// The requested tasks plus all their transitive hard prerequisites.
    pub fn closure<S: AsRef<str>>(&self, roots: &[S]) -> BTreeSet<TaskName> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = roots.iter().map(|r| r.as_ref()).collect();

        while let Some(name) = stack.pop() {
            if !self.nodes.contains_key(name) || !seen.insert(name.to_string()) {
                continue;
            }
            stack.extend(self.dependencies_of(name).iter().map(|d| d.as_str()));
        }
        seen
    }

    /// Topological execution order of the closure of `roots`, honouring soft
    /// edges between members of the closure.
    pub fn execution_plan<S: AsRef<str>>(&self, roots: &[S]) -> Vec<TaskName> {
        let members = self.closure(roots);

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in &members {
            graph.add_node(name.as_str());
        }
        for name in &members {
            let spec = &self.nodes[name].spec;
            for dep in spec.after.iter().chain(spec.runs_after.iter()) {
                if members.contains(dep) {
                    graph.add_edge(dep.as_str(), name.as_str(), ());
                }
            }
        }

        // The full graph was validated acyclic, so any subgraph is too.
        toposort(&graph, None)
            .map(|order| order.into_iter().map(str::to_string).collect())
            .unwrap_or_else(|_| members.iter().cloned().collect())
    }
}
