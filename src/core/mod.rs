//! Corpus-side building blocks: chunking, the chunk file format, query
//! normalization, configuration and errors.

pub mod chunk_file;
pub mod chunker;
pub mod config;
pub mod error;
pub mod normalize;
pub mod paths;
