use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "textbook.yaml";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const CORPUS_FILE: &str = "corpus.txt";
pub const CHUNKS_FILE: &str = "chunks.txt";
pub const INDEX_FILE: &str = "index.db";

/// On-disk layout of the pipeline artifacts.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    /// Extracted plain text of the textbook.
    pub corpus: PathBuf,
    /// Chunker output, indexer input.
    pub chunks: PathBuf,
    /// Embedding records and index metadata.
    pub index: PathBuf,
}

impl DataPaths {
    pub fn from_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            corpus: data_dir.join(CORPUS_FILE),
            chunks: data_dir.join(CHUNKS_FILE),
            index: data_dir.join(INDEX_FILE),
            data_dir,
        }
    }

    /// Resolve relative paths against `base` (usually the working directory).
    pub fn rooted_at(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| if p.is_absolute() { p.clone() } else { base.join(p) };
        Self {
            data_dir: join(&self.data_dir),
            corpus: join(&self.corpus),
            chunks: join(&self.chunks),
            index: join(&self.index),
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::from_dir(DEFAULT_DATA_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let paths = DataPaths::default();
        assert_eq!(paths.chunks, PathBuf::from("data/chunks.txt"));
        assert_eq!(paths.index, PathBuf::from("data/index.db"));
    }

    #[test]
    fn test_rooted_at_keeps_absolute_paths() {
        let mut paths = DataPaths::from_dir("data");
        paths.corpus = PathBuf::from("/srv/book.txt");
        let rooted = paths.rooted_at(Path::new("/work"));
        assert_eq!(rooted.corpus, PathBuf::from("/srv/book.txt"));
        assert_eq!(rooted.index, PathBuf::from("/work/data/index.db"));
    }
}
