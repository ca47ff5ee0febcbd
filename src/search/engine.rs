//! Search Engine - ranks textbook passages against a question
//!
//! An engine exists only once its index, records and embedder are loaded, and
//! nothing about it changes afterwards. `search` takes `&self`, so one engine
//! can serve many callers at once.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use super::embedding::Embedder;
use super::index::{l2_normalize, FlatIndex};
use super::indexer::BuiltIndex;
use super::vectordb::VectorDB;
use crate::core::config::RetrievalConfig;
use crate::core::error::{Result, RetrievalError};
use crate::core::normalize::{normalize_question, Language};

/// Passages with this many whitespace-separated tokens or fewer are never returned.
pub const MIN_RESULT_TOKENS: usize = 10;

/// One entry of a search response.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// A passage that cleared every filter. `similarity` is rounded to 3 decimals.
    Match {
        id: usize,
        chunk: String,
        similarity: f32,
    },
    /// Nothing relevant was found. Carries the localized message to show instead.
    NoMatch { message: String },
}

impl QueryResult {
    pub fn id(&self) -> Option<usize> {
        match self {
            QueryResult::Match { id, .. } => Some(*id),
            QueryResult::NoMatch { .. } => None,
        }
    }

    pub fn chunk(&self) -> &str {
        match self {
            QueryResult::Match { chunk, .. } => chunk,
            QueryResult::NoMatch { message } => message,
        }
    }

    pub fn similarity(&self) -> f32 {
        match self {
            QueryResult::Match { similarity, .. } => *similarity,
            QueryResult::NoMatch { .. } => 0.0,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, QueryResult::Match { .. })
    }
}

/// Serialized flat as `{"id": 12 | null, "chunk": "...", "similarity": 0.87}`.
impl Serialize for QueryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Flat<'a> {
            id: Option<usize>,
            chunk: &'a str,
            similarity: f32,
        }

        Flat {
            id: self.id(),
            chunk: self.chunk(),
            similarity: self.similarity(),
        }
        .serialize(serializer)
    }
}

/// Query-time policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub language: Language,
}

impl SearchSettings {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.search.top_k,
            similarity_threshold: config.search.similarity_threshold,
            language: config.language,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

/// Semantic search over an immutable index
pub struct SearchEngine {
    index: FlatIndex,
    /// `(chunk_id, text)`, aligned with index positions.
    passages: Vec<(usize, String)>,
    settings: SearchSettings,
    embedder: Arc<dyn Embedder>,
}

impl SearchEngine {
    /// Assemble an engine from an index built in this process.
    pub fn new(
        built: BuiltIndex,
        settings: SearchSettings,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let BuiltIndex { records, index, .. } = built;

        if index.is_empty() {
            return Err(RetrievalError::ArtifactMismatch(
                "index holds no passages".to_string(),
            ));
        }
        if records.len() != index.len() {
            return Err(RetrievalError::ArtifactMismatch(format!(
                "{} records for {} index vectors",
                records.len(),
                index.len()
            )));
        }
        if index.dimension() != embedder.dimension() {
            return Err(RetrievalError::ArtifactMismatch(format!(
                "index vectors have {} dimensions, model produces {}",
                index.dimension(),
                embedder.dimension()
            )));
        }

        let passages = records
            .into_iter()
            .map(|record| (record.chunk_id, record.text))
            .collect();

        Ok(Self {
            index,
            passages,
            settings,
            embedder,
        })
    }

    /// Load the index stored at `db_path`.
    pub fn load(
        db_path: &Path,
        settings: SearchSettings,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let db = VectorDB::open(db_path)?;
        let records = db.load_records(&embedder.model_id(), embedder.dimension())?;
        let built = BuiltIndex::from_records(records, embedder.dimension())?;

        info!(
            path = %db_path.display(),
            passages = built.records.len(),
            model = %embedder.model_id(),
            "search engine ready"
        );
        Self::new(built, settings, embedder)
    }

    pub fn passage_count(&self) -> usize {
        self.passages.len()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Find the passages most similar to `question`.
    ///
    /// Returns up to `top_k` matches in descending similarity. A candidate is
    /// kept only if it reaches the similarity threshold, has not been returned
    /// already, and has more than [`MIN_RESULT_TOKENS`] tokens. When nothing is
    /// kept the result is a single [`QueryResult::NoMatch`].
    pub fn search(&self, question: &str) -> Result<Vec<QueryResult>> {
        let normalized = normalize_question(question, self.settings.language);
        if normalized.is_empty() {
            debug!(question, "question has no content words");
            return Ok(vec![self.no_match()]);
        }

        let mut query = self.embedder.embed(&normalized)?;
        l2_normalize(&mut query);

        let candidates = self.index.search(&query, self.settings.top_k)?;

        let mut results = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();

        let threshold = self.settings.similarity_threshold;
        for (raw, position) in candidates {
            // Both the exact score and the reported one must clear the threshold.
            let similarity = round_similarity(raw);
            if raw < threshold || similarity < threshold {
                debug!(position, raw, "below threshold");
                continue;
            }
            if used.contains(&position) {
                continue;
            }
            let Some((chunk_id, text)) = self.passages.get(position) else {
                continue;
            };
            if text.split_whitespace().count() <= MIN_RESULT_TOKENS {
                debug!(chunk_id, "passage too short");
                continue;
            }

            used.insert(position);
            results.push(QueryResult::Match {
                id: *chunk_id,
                chunk: text.trim().to_string(),
                similarity,
            });
        }

        if results.is_empty() {
            debug!(query = %normalized, "no passage accepted");
            return Ok(vec![self.no_match()]);
        }

        Ok(results)
    }

    fn no_match(&self) -> QueryResult {
        QueryResult::NoMatch {
            message: self.settings.language.no_match_message().to_string(),
        }
    }
}

/// Round to 3 decimal places for stable display.
fn round_similarity(similarity: f32) -> f32 {
    (similarity * 1000.0).round() / 1000.0
}
