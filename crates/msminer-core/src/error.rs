use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the library. Descriptor content problems are not
/// errors; they degrade to an empty analysis.
#[derive(Debug, Error)]
pub enum MineError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load keyword list {}", path.display())]
    KeywordFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown dataset column: {0}")]
    UnknownColumn(String),
}
