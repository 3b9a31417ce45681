use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::types::Service;

/// Directed dependency graph between service names.
///
/// Simple graph: repeated edges collapse into one, self-edges are kept.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Graph over every declared service and every dependency target,
    /// declared or not.
    pub fn from_services(services: &[Service]) -> Self {
        let mut graph = Self::new();
        for service in services {
            graph.ensure_node(&service.name);
            for dep in &service.declared_dependencies {
                graph.add_dependency(&service.name, dep);
            }
        }
        graph
    }

    /// Ensure a node exists for `name`. Returns its index.
    pub fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Add an edge `from -> to`, creating missing endpoints.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        self.graph.update_edge(from_idx, to_idx, ());
    }

    /// Copy of this graph without the named nodes or any edge touching them.
    pub fn without_nodes(&self, removed: &HashSet<&str>) -> Self {
        let graph = self.graph.filter_map(
            |_, name| (!removed.contains(name.as_str())).then(|| name.clone()),
            |_, _| Some(()),
        );
        let index = graph
            .node_indices()
            .map(|idx| (graph[idx].clone(), idx))
            .collect();
        Self { graph, index }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> Vec<&str> {
        self.graph.node_weights().map(String::as_str).collect()
    }

    /// Edges as `(from, to)` name pairs.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()].as_str(), self.graph[e.target()].as_str()))
            .collect()
    }

    pub(crate) fn inner(&self) -> &DiGraph<String, ()> {
        &self.graph
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the full dependency graph and the graph restricted to
/// non-infrastructure services.
pub fn build_graphs(services: &[Service]) -> (DependencyGraph, DependencyGraph) {
    let full = DependencyGraph::from_services(services);
    let infrastructure: HashSet<&str> = services
        .iter()
        .filter(|s| s.is_infrastructure())
        .map(|s| s.name.as_str())
        .collect();
    let micro = full.without_nodes(&infrastructure);
    (full, micro)
}
