pub mod analysis;
pub mod classify;
pub mod config;
pub mod dataset;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod keywords;
pub mod metrics;
pub mod topology;
pub mod types;

pub use analysis::{analyze, analyze_file, CountSource, TopologyAnalysis};
pub use classify::ServiceClassifier;
pub use config::Config;
pub use error::MineError;
pub use graph::{build_graphs, DependencyGraph};
pub use keywords::{Category, KeywordClassifier, KeywordSet};
pub use metrics::{GraphMetrics, PathLength};
pub use types::*;
