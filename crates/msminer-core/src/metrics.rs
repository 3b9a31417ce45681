use std::fmt;

use petgraph::algo::toposort;
use petgraph::Direction;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::graph::DependencyGraph;

/// Length of the longest directed path, or `Infinite` when the graph has a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathLength {
    Finite(usize),
    Infinite,
}

impl PathLength {
    pub fn as_finite(&self) -> Option<usize> {
        match self {
            PathLength::Finite(n) => Some(*n),
            PathLength::Infinite => None,
        }
    }
}

impl fmt::Display for PathLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathLength::Finite(n) => write!(f, "{n}"),
            PathLength::Infinite => write!(f, "inf"),
        }
    }
}

impl Serialize for PathLength {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathLength::Finite(n) => serializer.serialize_u64(*n as u64),
            PathLength::Infinite => serializer.serialize_str("inf"),
        }
    }
}

impl<'de> Deserialize<'de> for PathLength {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PathLengthVisitor;

        impl Visitor<'_> for PathLengthVisitor {
            type Value = PathLength;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or \"inf\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PathLength, E> {
                Ok(PathLength::Finite(v as usize))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<PathLength, E> {
                usize::try_from(v)
                    .map(PathLength::Finite)
                    .map_err(|_| E::custom(format!("negative path length: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PathLength, E> {
                if v == "inf" {
                    Ok(PathLength::Infinite)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(PathLengthVisitor)
    }
}

/// Structural metrics of a dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub avg_out_degree: f64,
    pub is_acyclic: bool,
    pub longest_path_length: PathLength,
}

impl GraphMetrics {
    /// Metrics of the empty graph.
    pub fn empty() -> Self {
        Self {
            node_count: 0,
            edge_count: 0,
            avg_out_degree: 0.0,
            is_acyclic: true,
            longest_path_length: PathLength::Finite(0),
        }
    }
}

impl Default for GraphMetrics {
    fn default() -> Self {
        Self::empty()
    }
}

/// Compute node/edge counts, average fan-out, acyclicity and longest path.
pub fn compute(graph: &DependencyGraph) -> GraphMetrics {
    let g = graph.inner();
    let node_count = g.node_count();
    let out_degrees: usize = g
        .node_indices()
        .map(|n| g.neighbors_directed(n, Direction::Outgoing).count())
        .sum();
    let avg_out_degree = if node_count == 0 {
        0.0
    } else {
        out_degrees as f64 / node_count as f64
    };

    // toposort rejects self-loops as well as longer cycles.
    let (is_acyclic, longest_path_length) = match toposort(g, None) {
        Ok(order) => {
            let mut depth = vec![0usize; node_count];
            let mut longest = 0usize;
            for node in order {
                let d = depth[node.index()];
                longest = longest.max(d);
                for next in g.neighbors_directed(node, Direction::Outgoing) {
                    depth[next.index()] = depth[next.index()].max(d + 1);
                }
            }
            (true, PathLength::Finite(longest))
        }
        Err(_) => (false, PathLength::Infinite),
    };

    GraphMetrics {
        node_count,
        edge_count: g.edge_count(),
        avg_out_degree,
        is_acyclic,
        longest_path_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)], isolated: &[&str]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for name in isolated {
            g.ensure_node(name);
        }
        for (from, to) in edges {
            g.add_dependency(from, to);
        }
        g
    }

    #[test]
    fn test_empty_graph_metrics() {
        let m = compute(&DependencyGraph::new());
        assert_eq!(m, GraphMetrics::empty());
        assert_eq!(m.avg_out_degree, 0.0);
    }

    #[test]
    fn test_isolated_nodes_have_zero_path() {
        let m = compute(&graph(&[], &["a", "b", "c"]));
        assert_eq!(m.node_count, 3);
        assert_eq!(m.edge_count, 0);
        assert!(m.is_acyclic);
        assert_eq!(m.longest_path_length, PathLength::Finite(0));
    }

    #[test]
    fn test_longest_path_in_dag() {
        // a -> b -> c -> d and a shortcut a -> d
        let m = compute(&graph(&[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")], &[]));
        assert!(m.is_acyclic);
        assert_eq!(m.longest_path_length, PathLength::Finite(3));
        assert_eq!(m.avg_out_degree, 1.0);
    }

    #[test]
    fn test_longest_path_ignores_insertion_order() {
        let m = compute(&graph(&[("c", "d"), ("b", "c"), ("a", "b")], &[]));
        assert_eq!(m.longest_path_length, PathLength::Finite(3));
    }

    #[test]
    fn test_cycle_reports_infinite_path() {
        let m = compute(&graph(&[("a", "b"), ("b", "a")], &["c"]));
        assert!(!m.is_acyclic);
        assert_eq!(m.longest_path_length, PathLength::Infinite);
    }

    #[test]
    fn test_self_edge_is_a_cycle() {
        let m = compute(&graph(&[("a", "a")], &[]));
        assert!(!m.is_acyclic);
        assert_eq!(m.longest_path_length, PathLength::Infinite);
        assert_eq!(m.avg_out_degree, 1.0);
    }

    #[test]
    fn test_avg_out_degree_is_fractional() {
        let m = compute(&graph(&[("a", "b")], &["c"]));
        assert!((m.avg_out_degree - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_path_length_serialization() {
        assert_eq!(serde_json::to_string(&PathLength::Finite(2)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&PathLength::Infinite).unwrap(), "\"inf\"");
        let back: PathLength = serde_json::from_str("\"inf\"").unwrap();
        assert_eq!(back, PathLength::Infinite);
        assert!(serde_json::from_str::<PathLength>("\"forever\"").is_err());
    }

    #[test]
    fn test_as_finite() {
        assert_eq!(PathLength::Finite(4).as_finite(), Some(4));
        assert_eq!(PathLength::Infinite.as_finite(), None);
    }
}
