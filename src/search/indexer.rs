//! Index construction: chunks in, normalized embedding records and a flat
//! index out.

use std::time::Instant;

use tracing::{debug, info};

use super::embedding::Embedder;
use super::index::{l2_normalize, FlatIndex};
use super::vectordb::EmbeddingRecord;
use crate::core::chunker::Chunk;
use crate::core::error::{Result, RetrievalError};

/// Records and the index over their vectors. `index` position `i` holds
/// `records[i].vector`.
#[derive(Debug)]
pub struct BuiltIndex {
    pub records: Vec<EmbeddingRecord>,
    pub index: FlatIndex,
    /// Chunks dropped for being shorter than `min_chars`.
    pub filtered: usize,
    pub duration_ms: u128,
}

impl BuiltIndex {
    /// Rebuild the index from already-normalized records, e.g. after loading
    /// them from disk.
    pub fn from_records(records: Vec<EmbeddingRecord>, dimension: usize) -> Result<Self> {
        let mut index = FlatIndex::new(dimension);
        for record in &records {
            index.add_normalized(&record.vector)?;
        }
        Ok(Self {
            records,
            index,
            filtered: 0,
            duration_ms: 0,
        })
    }
}

/// Embed every chunk whose trimmed text has at least `min_chars` characters.
///
/// Short chunks are dropped before embedding. Vectors are unit-normalized
/// before they are stored, so index inner products are cosine similarities.
/// Fails with [`RetrievalError::EmptyCorpus`] when nothing survives the filter.
pub fn build(
    chunks: &[Chunk],
    min_chars: usize,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<BuiltIndex> {
    let start = Instant::now();

    let kept: Vec<(usize, &str)> = chunks
        .iter()
        .map(|chunk| (chunk.id, chunk.text.trim()))
        .filter(|(_, text)| text.chars().count() >= min_chars)
        .collect();

    let filtered = chunks.len() - kept.len();
    if filtered > 0 {
        debug!(filtered, min_chars, "dropped short chunks");
    }
    if kept.is_empty() {
        return Err(RetrievalError::EmptyCorpus { min_chars });
    }

    let dimension = embedder.dimension();
    let mut index = FlatIndex::new(dimension);
    let mut records = Vec::with_capacity(kept.len());

    for batch in kept.chunks(batch_size.max(1)) {
        let texts: Vec<&str> = batch.iter().map(|(_, text)| *text).collect();
        let vectors = embedder.embed_batch(&texts)?;
        if vectors.len() != batch.len() {
            return Err(RetrievalError::Embedding(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }

        for (&(chunk_id, text), mut vector) in batch.iter().zip(vectors) {
            l2_normalize(&mut vector);
            index.add_normalized(&vector)?;
            records.push(EmbeddingRecord {
                chunk_id,
                vector,
                text: text.to_string(),
            });
        }
        debug!(embedded = records.len(), total = kept.len(), "embedding progress");
    }

    let duration_ms = start.elapsed().as_millis();
    info!(
        records = records.len(),
        filtered,
        dimension,
        duration_ms = duration_ms as u64,
        "built index"
    );

    Ok(BuiltIndex {
        records,
        index,
        filtered,
        duration_ms,
    })
}
