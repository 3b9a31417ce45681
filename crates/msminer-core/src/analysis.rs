use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{self, ServiceClassifier};
use crate::error::MineError;
use crate::graph;
use crate::keywords::KeywordSet;
use crate::metrics::{self, GraphMetrics};
use crate::topology;
use crate::types::{DatabaseService, Service};

/// Which dependency graph supplies a snapshot's microservice count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountSource {
    /// Every declared service and dependency target.
    #[default]
    Full,
    /// Only services not classified as infrastructure.
    Microservice,
}

impl fmt::Display for CountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountSource::Full => write!(f, "full"),
            CountSource::Microservice => write!(f, "microservice"),
        }
    }
}

impl std::str::FromStr for CountSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(CountSource::Full),
            "microservice" | "micro" => Ok(CountSource::Microservice),
            _ => Err(anyhow::anyhow!("unknown count source: {s}")),
        }
    }
}

/// Structural analysis of one topology descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyAnalysis {
    /// Descriptor path relative to the analyzed root, when read from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub service_count: usize,
    pub services: Vec<Service>,
    pub database_services: Vec<DatabaseService>,
    pub shared_database: bool,
    pub full_graph_metrics: GraphMetrics,
    pub microservice_graph_metrics: GraphMetrics,
}

impl TopologyAnalysis {
    /// The "no services found" outcome.
    pub fn empty() -> Self {
        Self {
            path: None,
            service_count: 0,
            services: Vec::new(),
            database_services: Vec::new(),
            shared_database: false,
            full_graph_metrics: GraphMetrics::empty(),
            microservice_graph_metrics: GraphMetrics::empty(),
        }
    }

    /// Distinct database products detected, sorted.
    pub fn database_names(&self) -> Vec<&str> {
        self.database_services
            .iter()
            .map(|db| db.name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn microservice_count(&self, source: CountSource) -> usize {
        match source {
            CountSource::Full => self.full_graph_metrics.node_count,
            CountSource::Microservice => self.microservice_graph_metrics.node_count,
        }
    }
}

/// Parse, classify, build both dependency graphs and measure them.
pub fn analyze(descriptor: &str, keywords: &KeywordSet) -> TopologyAnalysis {
    let mut services = topology::parse(descriptor);
    if services.is_empty() {
        return TopologyAnalysis::empty();
    }

    let shared_database = ServiceClassifier::new(keywords).classify_services(&mut services);
    let (full, micro) = graph::build_graphs(&services);

    TopologyAnalysis {
        path: None,
        service_count: services.len(),
        database_services: classify::database_services(&services),
        shared_database,
        full_graph_metrics: metrics::compute(&full),
        microservice_graph_metrics: metrics::compute(&micro),
        services,
    }
}

/// Analyze the descriptor at `root/rel_path`.
///
/// Content that is not valid UTF-8 is treated like any other unreadable
/// descriptor and yields an empty analysis.
pub fn analyze_file(
    root: &Path,
    rel_path: &str,
    keywords: &KeywordSet,
) -> Result<TopologyAnalysis, MineError> {
    let path = root.join(rel_path);
    debug!(path = %path.display(), "analyzing topology descriptor");
    let bytes = std::fs::read(&path).map_err(|source| MineError::Io {
        path: path.clone(),
        source,
    })?;

    let mut analysis = match String::from_utf8(bytes) {
        Ok(text) => analyze(&text, keywords),
        Err(e) => {
            warn!(path = %path.display(), "descriptor is not valid UTF-8: {e}");
            TopologyAnalysis::empty()
        }
    };
    analysis.path = Some(rel_path.to_string());
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::Category;
    use crate::metrics::PathLength;

    const SHOP: &str = r#"
services:
  gateway:
    image: nginx:latest
  catalog-db:
    image: postgres:14
  catalog-service:
    image: myorg/catalog:1.0
    depends_on: [catalog-db]
"#;

    #[test]
    fn test_gateway_database_and_one_microservice() {
        let analysis = analyze(SHOP, &KeywordSet::bundled());

        assert_eq!(analysis.service_count, 3);
        assert_eq!(analysis.services[0].matched(Category::Gateway), Some("nginx"));
        assert_eq!(
            analysis.services[1].matched(Category::Database),
            Some("postgres")
        );
        assert!(!analysis.services[2].is_infrastructure());
        assert!(!analysis.shared_database);
        assert_eq!(analysis.database_names(), vec!["postgres"]);

        let full = &analysis.full_graph_metrics;
        assert_eq!((full.node_count, full.edge_count), (3, 1));
        assert!(full.is_acyclic);
        assert_eq!(full.longest_path_length, PathLength::Finite(1));

        let micro = &analysis.microservice_graph_metrics;
        assert_eq!((micro.node_count, micro.edge_count), (1, 0));
        assert!(micro.is_acyclic);
        assert_eq!(micro.longest_path_length, PathLength::Finite(0));

        assert_eq!(analysis.microservice_count(CountSource::Full), 3);
        assert_eq!(analysis.microservice_count(CountSource::Microservice), 1);
    }

    #[test]
    fn test_no_services_is_empty_analysis() {
        let keywords = KeywordSet::bundled();
        for text in ["", "version: '3'", "services: {}", "services: [oops", "{{{"] {
            let analysis = analyze(text, &keywords);
            assert_eq!(analysis, TopologyAnalysis::empty(), "input: {text:?}");
            assert_eq!(analysis.full_graph_metrics.node_count, 0);
            assert_eq!(analysis.microservice_graph_metrics.node_count, 0);
        }
    }

    #[test]
    fn test_repeated_analysis_is_identical() {
        let keywords = KeywordSet::bundled();
        let first = serde_json::to_string(&analyze(SHOP, &keywords)).unwrap();
        let second = serde_json::to_string(&analyze(SHOP, &keywords)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cyclic_microservices() {
        let yaml = r#"
services:
  orders:
    image: myorg/orders
    depends_on: [payments]
  payments:
    image: myorg/payments
    depends_on: [orders]
"#;
        let analysis = analyze(yaml, &KeywordSet::bundled());
        assert!(!analysis.microservice_graph_metrics.is_acyclic);
        assert_eq!(
            analysis.microservice_graph_metrics.longest_path_length,
            PathLength::Infinite
        );
    }

    #[test]
    fn test_merged_database_is_infrastructure() {
        let yaml = r#"
x-db: &db
  image: postgres:14
services:
  store:
    <<: *db
  api:
    image: myorg/api
    depends_on: [store]
"#;
        let analysis = analyze(yaml, &KeywordSet::bundled());
        assert_eq!(
            analysis.services[0].matched(Category::Database),
            Some("postgres")
        );
        assert_eq!(analysis.database_names(), vec!["postgres"]);
        let micro = &analysis.microservice_graph_metrics;
        assert_eq!((micro.node_count, micro.edge_count), (1, 0));
    }

    #[test]
    fn test_analyze_file_records_path_and_handles_bad_encoding() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("docker-compose.yml"), SHOP).unwrap();
        std::fs::write(dir.path().join("broken.yml"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
        let keywords = KeywordSet::bundled();

        let ok = analyze_file(dir.path(), "docker-compose.yml", &keywords).unwrap();
        assert_eq!(ok.path.as_deref(), Some("docker-compose.yml"));
        assert_eq!(ok.service_count, 3);

        let bad = analyze_file(dir.path(), "broken.yml", &keywords).unwrap();
        assert_eq!(bad.service_count, 0);

        assert!(analyze_file(dir.path(), "missing.yml", &keywords).is_err());
    }

    #[test]
    fn test_count_source_parse() {
        assert_eq!("full".parse::<CountSource>().unwrap(), CountSource::Full);
        assert_eq!(
            "micro".parse::<CountSource>().unwrap(),
            CountSource::Microservice
        );
        assert!("all".parse::<CountSource>().is_err());
    }
}
