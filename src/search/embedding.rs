//! Text embedding
//!
//! [`Embedder`] is the capability the indexer and the search engine depend on.
//! The bundled [`EmbeddingModel`] implements Harmonic Token Projection (HTP):
//! "Harmonic Token Projection: A Vocabulary-Free, Training-Free,
//!  Deterministic, and Reversible Embedding Methodology"
//! https://arxiv.org/html/2511.20665
//!
//! HTP needs no model file and is fully deterministic. It captures lexical
//! overlap rather than deep semantics, which suits a single-book corpus where
//! questions reuse the book's vocabulary.

use std::f64::consts::PI;

use crate::core::error::{Result, RetrievalError};

/// Default embedding dimension (two components per prime modulus).
pub const EMBEDDING_DIM: usize = 384;

/// Maximum token length (Unicode code points)
const MAX_TOKEN_LENGTH: usize = 64;

/// Turns text into fixed-length vectors.
///
/// Implementations must return vectors of exactly [`Embedder::dimension`]
/// floats. Callers normalize the vectors themselves.
pub trait Embedder: Send + Sync {
    /// Identifier stored with an index so a later load can detect a model change.
    fn model_id(&self) -> String;

    fn dimension(&self) -> usize;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| RetrievalError::Embedding("embedder returned no vector".to_string()))
    }
}

/// HTP embedding model
pub struct EmbeddingModel {
    moduli: Vec<u64>,
}

impl EmbeddingModel {
    /// Model with the default dimension.
    pub fn new() -> Self {
        Self::with_dimension(EMBEDDING_DIM)
    }

    /// Model producing `dimension`-length vectors. `dimension` must be even
    /// and non-zero; each prime modulus contributes a (sin, cos) pair.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            moduli: first_primes(dimension / 2),
        }
    }

    /// Embed one text.
    ///
    /// 1. Tokenize into lowercase words
    /// 2. Project each token onto the unit circle per modulus
    /// 3. Mean-pool token vectors
    /// 4. L2 normalize
    ///
    /// Text without tokens embeds to the zero vector.
    fn embed_text(&self, text: &str) -> Vec<f32> {
        let dim = self.moduli.len() * 2;
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; dim];
        }

        let mut sum = vec![0.0f64; dim];
        for token in &tokens {
            let n = token_to_integer(token);
            for (i, &m) in self.moduli.iter().enumerate() {
                let theta = 2.0 * PI * ((n % m) as f64) / (m as f64);
                sum[2 * i] += theta.sin();
                sum[2 * i + 1] += theta.cos();
            }
        }

        let count = tokens.len() as f64;
        for val in &mut sum {
            *val /= count;
        }

        let norm: f64 = sum.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            sum.iter().map(|x| (x / norm) as f32).collect()
        } else {
            sum.iter().map(|x| *x as f32).collect()
        }
    }
}

impl Default for EmbeddingModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for EmbeddingModel {
    fn model_id(&self) -> String {
        format!("htp-{}", self.dimension())
    }

    fn dimension(&self) -> usize {
        self.moduli.len() * 2
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Base-2^16 positional encoding of the token's code points.
/// Wraps on overflow; long tokens still map to a stable integer.
fn token_to_integer(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_LENGTH)
        .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64))
}

/// Lowercase words split on whitespace and punctuation (Unicode-aware).
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// The first `count` primes, which are pairwise coprime.
fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2u64;
    while primes.len() < count {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}
