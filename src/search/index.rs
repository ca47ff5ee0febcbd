//! Exhaustive inner-product index
//!
//! Vectors are stored unit-normalized, so the inner product of a normalized
//! query with a stored vector is their cosine similarity. Every query scans
//! every vector; the corpus is one book, and exact ranking matters more than
//! latency.

use crate::core::error::{Result, RetrievalError};

/// Scale `vector` to unit L2 norm in place. The zero vector is left as is.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in vector.iter_mut() {
            *val /= norm;
        }
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Flat index over normalized vectors. Position `i` is the `i`-th vector
/// added, which is also the `i`-th embedding record.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a vector, normalizing it first.
    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        let start = self.data.len();
        self.add_normalized(vector)?;
        l2_normalize(&mut self.data[start..]);
        Ok(())
    }

    /// Append a vector that is already unit length, bit for bit as given.
    pub fn add_normalized(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(RetrievalError::ArtifactMismatch(format!(
                "vector has {} dimensions, index expects {}",
                vector.len(),
                self.dimension
            )));
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// The `k` most similar positions as `(similarity, position)`, best first.
    /// Equal similarities keep insertion order. Positions scoring NaN are left out.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(f32, usize)>> {
        if query.len() != self.dimension {
            return Err(RetrievalError::ArtifactMismatch(format!(
                "query has {} dimensions, index expects {}",
                query.len(),
                self.dimension
            )));
        }
        if k == 0 || self.dimension == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| (dot(query, stored), position))
            .filter(|(score, _)| !score.is_nan())
            .collect();

        // Stable sort: ties stay in position order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        Ok(scored)
    }
}
