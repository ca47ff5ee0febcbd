//! End-to-end: corpus text -> chunk file -> index artifact -> search.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use textbook_search::{
    build, chunk_text, read_chunks, write_chunks, write_index, Chunk, Embedder, EmbeddingModel,
    Language, QueryResult, RetrievalError, SearchEngine, SearchSettings, VectorDB,
};

const ENGLISH_CORPUS: &str = "Search algorithms explore a state space by expanding nodes one at a time until they reach a goal. \
What is a rational agent? A rational agent is an agent that is rational, a rational agent. \
Bayesian networks encode conditional independence among many random variables compactly.";

const SPANISH_CORPUS: &str = "Los algoritmos de búsqueda exploran un espacio de estados expandiendo nodos hasta alcanzar una meta. \
¿Qué es un agente racional? Un agente racional es un agente que actúa de forma racional, un agente racional. \
Las redes bayesianas codifican la independencia condicional entre muchas variables aleatorias.";

/// Runs the offline pipeline into `dir` and returns the index path.
fn build_pipeline(dir: &Path, corpus: &str, max_chars: usize) -> std::path::PathBuf {
    let chunks_path = dir.join("chunks.txt");
    let index_path = dir.join("index.db");

    let chunks = Chunk::sequence(chunk_text(corpus, max_chars, 0));
    write_chunks(&chunks_path, &chunks).unwrap();

    let parsed = read_chunks(&chunks_path).unwrap();
    assert!(parsed.skipped.is_empty());
    assert_eq!(parsed.chunks, chunks);

    let model = EmbeddingModel::new();
    let built = build(&parsed.chunks, 50, &model, 2).unwrap();
    write_index(&index_path, &built.records, &model.model_id(), model.dimension()).unwrap();

    index_path
}

fn load(index_path: &Path, threshold: f32, language: Language) -> SearchEngine {
    let settings = SearchSettings {
        top_k: 3,
        similarity_threshold: threshold,
        language,
    };
    SearchEngine::load(index_path, settings, Arc::new(EmbeddingModel::new())).unwrap()
}

#[test]
fn rational_agent_question_finds_its_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let index_path = build_pipeline(dir.path(), ENGLISH_CORPUS, 100);
    let engine = load(&index_path, 0.6, Language::English);
    assert_eq!(engine.passage_count(), 3);

    let results = engine.search("What is a rational agent?").unwrap();
    assert_eq!(results.len(), 1);
    match &results[0] {
        QueryResult::Match {
            id,
            chunk,
            similarity,
        } => {
            assert_eq!(*id, 2);
            assert!(chunk.starts_with("What is a rational agent?"));
            assert!(*similarity >= 0.6 && *similarity <= 1.0);
        }
        other => panic!("expected a match, got {:?}", other),
    }
}

#[test]
fn spanish_question_with_default_settings() {
    let dir = tempfile::tempdir().unwrap();
    let index_path = build_pipeline(dir.path(), SPANISH_CORPUS, 120);
    let engine = SearchEngine::load(
        &index_path,
        SearchSettings::default(),
        Arc::new(EmbeddingModel::new()),
    )
    .unwrap();

    let results = engine.search("¿Qué es un agente racional?").unwrap();
    assert_eq!(results[0].id(), Some(2));
    assert!(results[0].similarity() >= 0.65);
}

#[test]
fn unrelated_question_gets_localized_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let index_path = build_pipeline(dir.path(), SPANISH_CORPUS, 120);
    let engine = load(&index_path, 0.99, Language::Spanish);

    let results = engine.search("cebra cuántica saxofón").unwrap();
    assert_eq!(
        results,
        vec![QueryResult::NoMatch {
            message: Language::Spanish.no_match_message().to_string()
        }]
    );

    let json = serde_json::to_value(&results).unwrap();
    assert!(json[0]["id"].is_null());
    assert_eq!(json[0]["similarity"], 0.0);
}

#[test]
fn results_respect_threshold_order_and_uniqueness() {
    let dir = tempfile::tempdir().unwrap();
    let index_path = build_pipeline(dir.path(), ENGLISH_CORPUS, 100);
    let threshold = 0.05;
    let engine = load(&index_path, threshold, Language::English);

    for question in [
        "rational agent",
        "search state space goal",
        "bayesian networks",
        "expanding nodes of an agent",
    ] {
        let results = engine.search(question).unwrap();
        assert!(!results.is_empty());

        let mut ids = HashSet::new();
        let mut previous = f32::INFINITY;
        for result in results.iter().filter(|r| r.is_match()) {
            let similarity = result.similarity();
            assert!(similarity >= threshold && similarity <= 1.0, "{question}");
            assert!(similarity <= previous, "{question}: not descending");
            assert!(ids.insert(result.id()), "{question}: duplicate chunk");
            previous = similarity;
        }
    }
}

#[test]
fn stored_vectors_are_unit_length() {
    let dir = tempfile::tempdir().unwrap();
    let index_path = build_pipeline(dir.path(), ENGLISH_CORPUS, 100);

    let model = EmbeddingModel::new();
    let db = VectorDB::open(&index_path).unwrap();
    let records = db.load_records(&model.model_id(), model.dimension()).unwrap();
    assert_eq!(records.len(), 3);
    for record in records {
        let norm: f32 = record.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "chunk {}", record.chunk_id);
    }
}

#[test]
fn index_built_with_other_dimension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let index_path = build_pipeline(dir.path(), ENGLISH_CORPUS, 100);

    let result = SearchEngine::load(
        &index_path,
        SearchSettings::default(),
        Arc::new(EmbeddingModel::with_dimension(128)),
    );
    assert!(matches!(result, Err(RetrievalError::ArtifactMismatch(_))));
}

#[test]
fn missing_index_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let result = SearchEngine::load(
        &dir.path().join("index.db"),
        SearchSettings::default(),
        Arc::new(EmbeddingModel::new()),
    );
    assert!(matches!(result, Err(RetrievalError::IndexNotFound(_))));
}

#[test]
fn corpus_of_headers_only_is_empty() {
    let chunks = Chunk::sequence(chunk_text("Chapter 1. Contents. Index.", 10, 0));
    assert_eq!(chunks.len(), 3);
    let result = build(&chunks, 50, &EmbeddingModel::new(), 32);
    assert!(matches!(result, Err(RetrievalError::EmptyCorpus { min_chars: 50 })));
}
