//! Embedding, indexing and query-time search
//!
//! Offline: chunks -> [`indexer::build`] -> [`vectordb::write_index`].
//! Online: [`SearchEngine::load`] once, then [`SearchEngine::search`] per question.

pub mod embedding;
pub mod engine;
pub mod index;
pub mod indexer;
pub mod vectordb;

pub use embedding::{Embedder, EmbeddingModel};
pub use engine::{QueryResult, SearchEngine, SearchSettings};
pub use index::FlatIndex;
pub use indexer::{build, BuiltIndex};
pub use vectordb::{write_index, EmbeddingRecord, VectorDB};
