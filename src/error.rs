//! Error types for proto generation

use std::path::PathBuf;

use thiserror::Error;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, ProtoGenError>;

/// Generator errors
///
/// Every variant is fatal: the run stops before any output file is written,
/// except `OutputWrite`, which aborts the remaining writes.
#[derive(Error, Debug)]
pub enum ProtoGenError {
    #[error("Failed to parse declarations in {path}: {message}")]
    ParseInput { path: PathBuf, message: String },

    #[error("Type alias cycle: {}", chain.join(" -> "))]
    AliasCycle { chain: Vec<String> },

    #[error("Embedding cycle: {}", chain.join(" -> "))]
    EmbeddingCycle { chain: Vec<String> },

    #[error("Unknown message '{name}' referenced by '{referenced_by}'")]
    UnknownMessage { name: String, referenced_by: String },

    #[error("Name collision: '{name}' is declared in both {first} and {second}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("Failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl ProtoGenError {
    /// Build a `ParseInput` error for a manifest path
    pub fn parse_input(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ParseInput {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
