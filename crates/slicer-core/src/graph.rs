//! Dependency graph over computed settings and its evaluation order.
//!
//! Every setting with a value formula is a node. Edges point from a setting
//! to the settings its formula reads: if `top_layers` reads `layer_height`
//! and `layer_height` is itself computed, the edge is
//! `top_layers -> layer_height` and [`DependencyGraph::topological_order`]
//! places `layer_height` first. References to settings without a formula are
//! kept as edges but are not nodes; they are always available from defaults.
//!
//! # Example
//!
//! ```
//! use slicer_core::graph::DependencyGraph;
//! use std::collections::{BTreeMap, BTreeSet};
//!
//! let graph = DependencyGraph::from_edges(BTreeMap::from([
//!     ("c".to_string(), BTreeSet::from(["b".to_string()])),
//!     ("b".to_string(), BTreeSet::from(["a".to_string()])),
//! ]));
//!
//! assert_eq!(graph.topological_order(), vec!["b", "c"]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use slicer_expr::extract_references;
use slicer_schema::AttributeTable;

/// Static dependency structure of the computed settings in one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Settings carrying a value formula.
    nodes: BTreeSet<String>,
    /// Adjacency list: key depends on each value. Empty sets are not stored.
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze every formula in `table` without evaluating anything.
    ///
    /// References that are not setting keys (helper names, locals) are
    /// discarded. A formula that fails to parse contributes a node with no
    /// edges; the failure surfaces later as an evaluation error.
    pub fn build(table: &AttributeTable) -> Self {
        let mut graph = Self::new();
        for attr in table.iter() {
            let Some(expression) = attr.value_expression.as_deref() else {
                continue;
            };
            let deps: BTreeSet<String> = extract_references(expression)
                .into_iter()
                .filter(|name| table.contains(name))
                .collect();
            graph.add_node(&attr.key, deps);
        }
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built dependency graph"
        );
        graph
    }

    /// Build a graph directly from an adjacency map. Every map key is a node.
    pub fn from_edges(edges: BTreeMap<String, BTreeSet<String>>) -> Self {
        let mut graph = Self::new();
        for (key, deps) in edges {
            graph.add_node(&key, deps);
        }
        graph
    }

    fn add_node(&mut self, key: &str, deps: BTreeSet<String>) {
        self.nodes.insert(key.to_string());
        if !deps.is_empty() {
            self.edges.insert(key.to_string(), deps);
        }
    }

    /// Number of computed settings.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of recorded references.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Whether `key` carries a formula in the analyzed table.
    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains(key)
    }

    /// Computed settings in lexical order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// The adjacency map, omitting nodes without references.
    pub fn edges(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.edges
    }

    /// Settings the formula of `key` reads.
    pub fn dependencies_of(&self, key: &str) -> Vec<&str> {
        self.edges
            .get(key)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Computed settings whose formulas read `key`.
    pub fn dependents_of(&self, key: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.contains(key))
            .map(|(dependent, _)| dependent.as_str())
            .collect()
    }

    /// Evaluation order over all nodes, dependencies first.
    ///
    /// Kahn's algorithm with the smallest ready key taken first. Nodes caught
    /// in a cycle never become ready; they are appended after the ordered
    /// prefix in lexical order instead of failing.
    pub fn topological_order(&self) -> Vec<String> {
        let (mut order, cyclic) = self.kahn();
        order.extend(cyclic);
        order
    }

    /// Nodes that sit on or behind a dependency cycle.
    pub fn cyclic_keys(&self) -> Vec<String> {
        self.kahn().1
    }

    fn kahn(&self) -> (Vec<String>, Vec<String>) {
        // In-degree counts only dependencies that are themselves nodes
        let mut in_degree: BTreeMap<&str, usize> =
            self.nodes.iter().map(|key| (key.as_str(), 0)).collect();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (key, deps) in &self.edges {
            for dep in deps.iter().filter(|dep| self.nodes.contains(*dep)) {
                *in_degree.entry(key.as_str()).or_insert(0) += 1;
                dependents.entry(dep.as_str()).or_default().push(key.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(key, _)| *key)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(key) = ready.pop_first() {
            order.push(key.to_string());
            for dependent in dependents.get(key).into_iter().flatten() {
                if let Some(deg) = in_degree.get_mut(dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        let cyclic = in_degree
            .into_iter()
            .filter(|(_, deg)| *deg > 0)
            .map(|(key, _)| key.to_string())
            .collect();
        (order, cyclic)
    }
}
