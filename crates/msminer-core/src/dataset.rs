use std::collections::HashMap;
use std::path::Path;

use crate::analysis::{analyze_file, CountSource};
use crate::config::Config;
use crate::discovery::locate_descriptors;
use crate::error::MineError;
use crate::keywords::KeywordSet;

/// Code-quality measures reported by the external analysis server.
pub const QUALITY_METRICS: [&str; 29] = [
    // complexity
    "COMPLEXITY",
    "COGNITIVE_COMPLEXITY",
    // issues
    "VIOLATIONS",
    "BLOCKER_VIOLATIONS",
    "CRITICAL_VIOLATIONS",
    "MAJOR_VIOLATIONS",
    "MINOR_VIOLATIONS",
    "INFO_VIOLATIONS",
    // maintainability
    "CODE_SMELLS",
    "SQALE_RATING",
    "SQALE_INDEX",
    "SQALE_DEBT_RATIO",
    // quality gate
    "ALERT_STATUS",
    // reliability
    "BUGS",
    "RELIABILITY_RATING",
    "RELIABILITY_REMEDIATION_EFFORT",
    // security
    "VULNERABILITIES",
    "SECURITY_RATING",
    "SECURITY_REMEDIATION_EFFORT",
    "SECURITY_HOTSPOTS",
    // size
    "CLASSES",
    "COMMENT_LINES",
    "COMMENT_LINES_DENSITY",
    "DIRECTORIES",
    "FILES",
    "LINES",
    "NCLOC",
    "FUNCTIONS",
    "STATEMENTS",
];

/// Commit identity and history columns preceding the quality metrics.
pub const COMMIT_COLUMNS: [&str; 11] = [
    "REPO",
    "COMMIT",
    "AUTHOR_NAME",
    "AUTHOR_EMAIL",
    "AUTHOR_DATE",
    "AUTHORS",
    "COMMITTER_NAME",
    "COMMITTER_EMAIL",
    "COMMITTER_DATE",
    "COMMITTERS",
    "MICROSERVICES",
];

/// Full dataset header, in column order.
pub fn columns() -> impl Iterator<Item = &'static str> {
    COMMIT_COLUMNS.iter().chain(QUALITY_METRICS.iter()).copied()
}

/// One dataset row. Columns never set render as empty cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetRow {
    values: HashMap<&'static str, String>,
}

impl DatasetRow {
    pub fn new(repo: &str, commit: &str) -> Self {
        let mut row = Self::default();
        row.values.insert("REPO", repo.to_string());
        row.values.insert("COMMIT", commit.to_string());
        row
    }

    /// Set a column value. Column names are case-insensitive.
    pub fn set(&mut self, column: &str, value: impl Into<String>) -> Result<(), MineError> {
        let upper = column.to_uppercase();
        let key = columns()
            .find(|c| *c == upper)
            .ok_or_else(|| MineError::UnknownColumn(column.to_string()))?;
        self.values.insert(key, value.into());
        Ok(())
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Cell values in header order.
    pub fn cells(&self) -> Vec<&str> {
        columns().map(|c| self.get(c).unwrap_or("")).collect()
    }
}

/// Microservice count of a repository snapshot and the descriptor it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotCount {
    /// Relative path of the descriptor counted, if any was located.
    pub descriptor: Option<String>,
    pub microservices: usize,
}

/// Count the microservices of a repository snapshot.
///
/// Zero when no descriptor is found; otherwise taken from the first located
/// descriptor.
pub fn snapshot_count(
    root: &Path,
    config: &Config,
    keywords: &KeywordSet,
    source: CountSource,
) -> Result<SnapshotCount, MineError> {
    let descriptors = locate_descriptors(root, &config.discovery);
    let Some(first) = descriptors.into_iter().next() else {
        return Ok(SnapshotCount::default());
    };
    let analysis = analyze_file(root, &first, keywords)?;
    Ok(SnapshotCount {
        microservices: analysis.microservice_count(source),
        descriptor: Some(first),
    })
}
