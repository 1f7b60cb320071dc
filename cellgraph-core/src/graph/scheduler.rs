//! Update Scheduler
//!
//! The scheduler owns the graph topology and determines the order in which
//! invalidated cells are brought back up to date. It ensures dependencies
//! always come before their dependents.
//!
//! # Algorithm
//!
//! 1. When a cell is invalidated, collect it and all transitive dependents
//!    (breadth-first over the dependent edges).
//! 2. Sort the collected cells topologically (Kahn's algorithm restricted
//!    to the collected set), visiting dependents in declaration order.
//! 3. The runtime bumps each cell's generation in that order and restarts
//!    the ones consumers have observed.
//!
//! Cycles are rejected when a cell is added, so every traversal here runs
//! on a DAG.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use super::node::{CellId, Node};
use crate::error::ConfigError;

/// The update scheduler manages the dependency graph and coordinates updates.
#[derive(Debug, Default)]
pub struct UpdateScheduler {
    /// All nodes in the graph, in definition order.
    nodes: IndexMap<CellId, Node>,
}

impl UpdateScheduler {
    /// Create a new empty scheduler.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }

    /// Add a node to the graph, wiring it into its dependencies' dependent sets.
    ///
    /// Fails if a dependency is missing or the new edges close a cycle; the
    /// graph is left unchanged in both cases.
    pub fn add_node(&mut self, node: Node) -> Result<CellId, ConfigError> {
        let id = node.id();

        if let Some(missing) = node
            .dependencies()
            .iter()
            .find(|dep| !self.nodes.contains_key(*dep))
        {
            return Err(ConfigError::UnknownDependency {
                cell: node.name().to_string(),
                dependency: format!("#{}", missing.raw()),
            });
        }

        let dependencies = node.dependencies().clone();
        self.nodes.insert(id, node);
        for dep_id in &dependencies {
            if let Some(dep) = self.nodes.get_mut(dep_id) {
                dep.add_dependent(id);
            }
        }

        if let Some(cycle) = self.find_cycle() {
            let path = cycle.iter().map(|id| self.name_of(*id)).collect();
            let cell = self.name_of(id);
            self.remove_node(id);
            return Err(ConfigError::Cycle { cell, path });
        }

        Ok(id)
    }

    /// Remove a node from the graph.
    ///
    /// Also removes the edges from its dependencies.
    pub fn remove_node(&mut self, node_id: CellId) {
        if let Some(node) = self.nodes.shift_remove(&node_id) {
            for dep_id in node.dependencies() {
                if let Some(dep) = self.nodes.get_mut(dep_id) {
                    dep.remove_dependent(node_id);
                }
            }
        }
    }

    /// Get a reference to a node.
    pub fn get_node(&self, node_id: CellId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable reference to a node.
    pub fn get_node_mut(&mut self, node_id: CellId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Iterate over nodes in definition order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Collect a node and all of its transitive dependents.
    ///
    /// Returns them topologically sorted, so the invalidated node comes
    /// first and every dependent follows all of its own dependencies.
    pub fn invalidation_order(&self, source_id: CellId) -> Vec<CellId> {
        if !self.nodes.contains_key(&source_id) {
            return Vec::new();
        }

        let mut affected = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([source_id]);

        while let Some(node_id) = queue.pop_front() {
            if !visited.insert(node_id) {
                continue;
            }
            affected.push(node_id);

            if let Some(node) = self.nodes.get(&node_id) {
                queue.extend(node.dependents().iter().copied());
            }
        }

        self.topological_sort(affected)
    }

    /// Perform a topological sort of the given nodes.
    ///
    /// Returns nodes in order such that dependencies come before dependents.
    /// Nodes on a cycle are left out of the result.
    fn topological_sort(&self, nodes: Vec<CellId>) -> Vec<CellId> {
        let node_set: HashSet<_> = nodes.iter().copied().collect();
        let mut in_degree: HashMap<CellId, usize> = HashMap::new();
        let mut result = Vec::with_capacity(nodes.len());
        let mut queue = VecDeque::new();

        // Calculate in-degrees (only counting edges within the node set)
        for &node_id in &nodes {
            if let Some(node) = self.nodes.get(&node_id) {
                let degree = node
                    .dependencies()
                    .iter()
                    .filter(|d| node_set.contains(d))
                    .count();
                in_degree.insert(node_id, degree);
                if degree == 0 {
                    queue.push_back(node_id);
                }
            }
        }

        // Kahn's algorithm
        while let Some(node_id) = queue.pop_front() {
            result.push(node_id);

            if let Some(node) = self.nodes.get(&node_id) {
                for &dependent_id in node.dependents() {
                    if let Some(degree) = in_degree.get_mut(&dependent_id) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(dependent_id);
                        }
                    }
                }
            }
        }

        result
    }

    /// Find a dependency cycle anywhere in the graph.
    ///
    /// Returns the cycle as a path that starts and ends on the same node.
    pub fn find_cycle(&self) -> Option<Vec<CellId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            graph: &UpdateScheduler,
            id: CellId,
            marks: &mut HashMap<CellId, Mark>,
            stack: &mut Vec<CellId>,
        ) -> Option<Vec<CellId>> {
            match marks.get(&id) {
                Some(Mark::Done) => return None,
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|s| *s == id).unwrap_or(0);
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(id);
                    return Some(cycle);
                }
                None => {}
            }

            marks.insert(id, Mark::Visiting);
            stack.push(id);
            if let Some(node) = graph.nodes.get(&id) {
                for dep in node.dependencies() {
                    if let Some(cycle) = visit(graph, *dep, marks, stack) {
                        return Some(cycle);
                    }
                }
            }
            stack.pop();
            marks.insert(id, Mark::Done);
            None
        }

        let mut marks = HashMap::new();
        let mut stack = Vec::new();
        self.nodes
            .keys()
            .find_map(|id| visit(self, *id, &mut marks, &mut stack))
    }

    fn name_of(&self, id: CellId) -> String {
        self.nodes
            .get(&id)
            .map(|node| node.name().to_string())
            .unwrap_or_else(|| format!("#{}", id.raw()))
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
