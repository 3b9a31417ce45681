use serde::Serialize;

use msminer_core::analysis::TopologyAnalysis;

/// Format analyses as JSON.
pub fn format_report(analyses: &[TopologyAnalysis], compact: bool) -> String {
    if compact {
        serde_json::to_string(analyses).expect("TopologyAnalysis should be serializable")
    } else {
        serde_json::to_string_pretty(analyses).expect("TopologyAnalysis should be serializable")
    }
}

/// Wrapper for `count` output.
#[derive(Debug, Serialize)]
pub struct CountOutput<'a> {
    pub descriptor: Option<&'a str>,
    pub source: String,
    pub microservices: usize,
}

/// Format a snapshot microservice count as JSON.
pub fn format_count(output: &CountOutput<'_>, compact: bool) -> String {
    if compact {
        serde_json::to_string(output).expect("CountOutput should be serializable")
    } else {
        serde_json::to_string_pretty(output).expect("CountOutput should be serializable")
    }
}
