//! Pipeline configuration
//!
//! Loaded from an optional YAML file. Every field has a default, so an absent
//! file or a partial one is fine.
//!
//! ```yaml
//! language: spanish
//! chunking:
//!   max_chars: 500
//!   overlap_sentences: 1
//! indexing:
//!   min_chars: 50
//! search:
//!   top_k: 3
//!   similarity_threshold: 0.65
//! paths:
//!   data_dir: data
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{Result, RetrievalError};
use super::normalize::Language;
use super::paths::{DataPaths, DEFAULT_DATA_DIR};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub language: Language,
    pub chunking: ChunkingConfig,
    pub indexing: IndexingConfig,
    pub search: SearchConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Soft character budget per chunk.
    pub max_chars: usize,
    /// Sentences repeated at the start of the next chunk.
    pub overlap_sentences: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 500,
            overlap_sentences: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Chunks whose trimmed text is shorter than this are not indexed.
    pub min_chars: usize,
    /// Texts sent to the embedder per call.
    pub batch_size: usize,
    pub embedding_dim: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            min_chars: 50,
            batch_size: 32,
            embedding_dim: crate::search::embedding::EMBEDDING_DIM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidates pulled from the index before filtering.
    pub top_k: usize,
    /// Minimum cosine similarity for a passage to be returned.
    pub similarity_threshold: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            similarity_threshold: 0.65,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            corpus: None,
            chunks: None,
            index: None,
        }
    }
}

impl PathsConfig {
    pub fn data_paths(&self) -> DataPaths {
        let mut paths = DataPaths::from_dir(&self.data_dir);
        if let Some(corpus) = &self.corpus {
            paths.corpus = corpus.clone();
        }
        if let Some(chunks) = &self.chunks {
            paths.chunks = chunks.clone();
        }
        if let Some(index) = &self.index {
            paths.index = index.clone();
        }
        paths
    }
}

impl RetrievalConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a struct of defaults.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| -> Result<()> { Err(RetrievalError::Config(msg.to_string())) };

        if self.chunking.max_chars == 0 {
            return fail("chunking.max_chars must be greater than 0");
        }
        if self.indexing.batch_size == 0 {
            return fail("indexing.batch_size must be greater than 0");
        }
        if self.indexing.embedding_dim == 0 || self.indexing.embedding_dim % 2 != 0 {
            return fail("indexing.embedding_dim must be a positive even number");
        }
        if self.search.top_k == 0 {
            return fail("search.top_k must be at least 1");
        }
        let threshold = self.search.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return fail("search.similarity_threshold must be within [0, 1]");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.language, Language::Spanish);
        assert_eq!(config.chunking.max_chars, 500);
        assert_eq!(config.chunking.overlap_sentences, 1);
        assert_eq!(config.indexing.min_chars, 50);
        assert_eq!(config.search.top_k, 3);
        assert!((config.search.similarity_threshold - 0.65).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "language: english\nsearch:\n  similarity_threshold: 0.6\n";
        let config = RetrievalConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.language, Language::English);
        assert_eq!(config.search.top_k, 3);
        assert!((config.search.similarity_threshold - 0.6).abs() < f32::EPSILON);
        assert_eq!(config.chunking, ChunkingConfig::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(RetrievalConfig::from_yaml("").unwrap(), RetrievalConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            "search:\n  top_k: 0\n",
            "search:\n  similarity_threshold: 1.5\n",
            "chunking:\n  max_chars: 0\n",
            "indexing:\n  embedding_dim: 7\n",
        ];
        for yaml in cases {
            let err = RetrievalConfig::from_yaml(yaml).unwrap_err();
            assert!(matches!(err, RetrievalError::Config(_)), "{yaml}");
        }
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = RetrievalConfig::default();
        config.paths.index = Some(PathBuf::from("/var/lib/book/index.db"));
        let parsed = RetrievalConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_path_overrides() {
        let mut paths = PathsConfig::default();
        paths.chunks = Some(PathBuf::from("custom/chunks.txt"));
        let resolved = paths.data_paths();
        assert_eq!(resolved.chunks, PathBuf::from("custom/chunks.txt"));
        assert_eq!(resolved.index, PathBuf::from("data/index.db"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = RetrievalConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, RetrievalConfig::default());
    }
}
