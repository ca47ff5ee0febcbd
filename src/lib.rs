//! textbook-search library
//!
//! Retrieval over a fixed textbook: answers a question with the book's own
//! passages instead of generated text.
//!
//! # Modules
//!
//! - `core`: chunking, the chunk file format, query normalization, config
//! - `search`: embeddings, the flat index, index build and semantic search

pub mod core;
pub mod search;

// Re-exports for convenience
pub use self::core::chunk_file::{parse_chunks, read_chunks, render_chunks, write_chunks, ParsedChunks};
pub use self::core::chunker::{chunk_text, split_sentences, Chunk};
pub use self::core::config::RetrievalConfig;
pub use self::core::error::{CorpusFormatError, Result, RetrievalError};
pub use self::core::normalize::{normalize_question, Language};
pub use self::core::paths::DataPaths;
pub use search::{
    build, write_index, BuiltIndex, Embedder, EmbeddingModel, EmbeddingRecord, FlatIndex,
    QueryResult, SearchEngine, SearchSettings, VectorDB,
};
