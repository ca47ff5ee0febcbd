use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by chunking, indexing, and search.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("no chunks left after filtering (min_chars = {min_chars}); refusing to build an empty index")]
    EmptyCorpus { min_chars: usize },

    #[error("index artifact does not match: {0}")]
    ArtifactMismatch(String),

    #[error("index artifact not found at {0}")]
    IndexNotFound(PathBuf),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

/// A chunk-file block that could not be read. Collected and reported, never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("chunk block {block}: {reason}")]
pub struct CorpusFormatError {
    /// 1-based ordinal of the block within the file.
    pub block: usize,
    pub reason: String,
}
