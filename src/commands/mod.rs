pub mod chunk;
pub mod index;
pub mod init;
pub mod search;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use textbook_search::{DataPaths, EmbeddingModel, RetrievalConfig};

/// Config and resolved artifact paths for one CLI invocation.
pub struct Workspace {
    pub config: RetrievalConfig,
    pub paths: DataPaths,
}

impl Workspace {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = RetrievalConfig::load(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: RetrievalConfig) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let paths = config.paths.data_paths().rooted_at(&cwd);
        Self { config, paths }
    }

    /// Re-check the config after command-line overrides were applied.
    pub fn validate(&self) -> Result<()> {
        self.config.validate().context("Invalid settings")
    }

    pub fn embedder(&self) -> EmbeddingModel {
        EmbeddingModel::with_dimension(self.config.indexing.embedding_dim)
    }
}
