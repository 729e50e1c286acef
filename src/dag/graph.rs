// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::engine::TaskName;
use crate::errors::{AssetdagError, Result};

/// What a task does, as far as scheduling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Removes the output root.
    Clean,
    /// Lint/test: pass/fail only; may be advisory.
    Validator,
    /// Produces deployable artifacts.
    Producer,
    /// No action of its own; completes when its dependencies settle.
    Group,
}

/// Internal node structure: stores kind, immediate deps and dependents.
#[derive(Debug, Clone)]
struct TaskNode {
    kind: TaskKind,
    /// Direct dependencies: tasks that must complete before this one runs.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskName>,
}

/// Immutable task graph keyed by task name.
///
/// Only obtainable through [`TaskGraphBuilder::build`], which rejects
/// unknown dependencies, duplicates, self-dependencies and cycles.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: BTreeMap<TaskName, TaskNode>,
}

impl TaskGraph {
    pub fn builder() -> TaskGraphBuilder {
        TaskGraphBuilder::new()
    }

    /// Return all task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<TaskKind> {
        self.nodes.get(name).map(|n| n.kind)
    }

    /// Immediate dependencies of a task, in declaration order.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// `entry` plus everything it transitively depends on.
    pub fn dependency_closure(&self, entry: &str) -> Result<BTreeSet<TaskName>> {
        if !self.contains(entry) {
            return Err(AssetdagError::TaskNotFound(entry.to_string()));
        }

        let mut closure = BTreeSet::new();
        let mut stack = vec![entry.to_string()];
        while let Some(name) = stack.pop() {
            if closure.insert(name.clone()) {
                stack.extend(self.dependencies_of(&name).iter().cloned());
            }
        }
        Ok(closure)
    }

    /// Topological order of the subgraph induced by `subset`.
    ///
    /// Edges to tasks outside `subset` are ignored.
    pub fn topological_order(&self, subset: &BTreeSet<TaskName>) -> Result<Vec<TaskName>> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in subset {
            if !self.contains(name) {
                return Err(AssetdagError::TaskNotFound(name.clone()));
            }
            graph.add_node(name.as_str());
        }

        for name in subset {
            for dep in self.dependencies_of(name) {
                if subset.contains(dep) {
                    graph.add_edge(dep.as_str(), name.as_str(), ());
                }
            }
        }

        toposort(&graph, None)
            .map(|order| order.into_iter().map(str::to_string).collect())
            .map_err(|cycle| {
                AssetdagError::DagCycle(format!(
                    "cycle detected in task graph involving task '{}'",
                    cycle.node_id()
                ))
            })
    }
}

/// Collects task declarations and validates them into a [`TaskGraph`].
#[derive(Debug, Default)]
pub struct TaskGraphBuilder {
    declared: Vec<(TaskName, TaskKind, Vec<TaskName>)>,
}

impl TaskGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a task and the tasks it depends on.
    pub fn declare<N, I, D>(mut self, name: N, kind: TaskKind, depends_on: I) -> Self
    where
        N: Into<TaskName>,
        I: IntoIterator<Item = D>,
        D: Into<TaskName>,
    {
        self.declared.push((
            name.into(),
            kind,
            depends_on.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Validate the declarations and build the graph.
    ///
    /// Fails with `ConfigError` for duplicates, unknown or self
    /// dependencies, and with `DagCycle` if the dependencies form a cycle.
    pub fn build(self) -> Result<TaskGraph> {
        let mut nodes: BTreeMap<TaskName, TaskNode> = BTreeMap::new();

        for (name, kind, deps) in self.declared {
            if nodes.contains_key(&name) {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{name}' is declared more than once"
                )));
            }
            let mut seen = HashSet::new();
            let deps = deps.into_iter().filter(|d| seen.insert(d.clone())).collect();
            nodes.insert(
                name,
                TaskNode {
                    kind,
                    deps,
                    dependents: Vec::new(),
                },
            );
        }

        for (name, node) in nodes.iter() {
            for dep in node.deps.iter() {
                if dep == name {
                    return Err(AssetdagError::ConfigError(format!(
                        "task '{name}' cannot depend on itself"
                    )));
                }
                if !nodes.contains_key(dep) {
                    return Err(AssetdagError::ConfigError(format!(
                        "task '{name}' has unknown dependency '{dep}'"
                    )));
                }
            }
        }

        // Populate dependents based on deps.
        let edges: Vec<(TaskName, TaskName)> = nodes
            .iter()
            .flat_map(|(name, node)| node.deps.iter().map(move |d| (d.clone(), name.clone())))
            .collect();
        for (dep, dependent) in edges {
            if let Some(dep_node) = nodes.get_mut(&dep) {
                dep_node.dependents.push(dependent);
            }
        }

        let graph = TaskGraph { nodes };

        // A topological sort of the whole graph fails if there is a cycle.
        let all: BTreeSet<TaskName> = graph.nodes.keys().cloned().collect();
        graph.topological_order(&all)?;

        Ok(graph)
    }
}
