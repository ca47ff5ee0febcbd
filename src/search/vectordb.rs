//! Embedding record store using SQLite
//!
//! One database file holds every embedding record (position, chunk id, text,
//! vector) together with the metadata needed to validate it on load. Vector
//! and text live in the same row, so they cannot drift apart.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use crate::core::error::{Result, RetrievalError};

const META_MODEL_ID: &str = "model_id";
const META_DIMENSION: &str = "dimension";
const META_RECORD_COUNT: &str = "record_count";
const META_BUILT_AT: &str = "built_at";

/// A chunk with its embedding. `vector` is unit-normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub chunk_id: usize,
    pub vector: Vec<f32>,
    pub text: String,
}

/// Summary of a stored index.
#[derive(Debug)]
pub struct IndexStats {
    pub record_count: usize,
    pub dimension: Option<usize>,
    pub model_id: Option<String>,
    pub built_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Embedding record database
pub struct VectorDB {
    conn: Connection,
}

impl VectorDB {
    /// Open an existing index read-only.
    pub fn open(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            return Err(RetrievalError::IndexNotFound(db_path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Create a fresh database at `db_path`, discarding any file already there.
    fn create(db_path: &Path) -> Result<Self> {
        if db_path.exists() {
            fs::remove_file(db_path)?;
        }
        let conn = Connection::open(db_path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            -- One row per indexed chunk; position is the index slot
            CREATE TABLE IF NOT EXISTS records (
                position INTEGER PRIMARY KEY,
                chunk_id INTEGER NOT NULL UNIQUE,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );
            "#,
        )?;

        Ok(())
    }

    /// Replace every record and the metadata in one transaction.
    pub fn replace_all(
        &mut self,
        records: &[EmbeddingRecord],
        model_id: &str,
        dimension: usize,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM records", [])?;
        tx.execute("DELETE FROM index_meta", [])?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO records (position, chunk_id, text, embedding) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, record) in records.iter().enumerate() {
                if record.vector.len() != dimension {
                    return Err(RetrievalError::ArtifactMismatch(format!(
                        "chunk {} has {} dimensions, expected {}",
                        record.chunk_id,
                        record.vector.len(),
                        dimension
                    )));
                }
                insert.execute(params![
                    position as i64,
                    record.chunk_id as i64,
                    record.text,
                    embedding_to_blob(&record.vector),
                ])?;
            }

            let mut meta =
                tx.prepare("INSERT INTO index_meta (key, value) VALUES (?1, ?2)")?;
            meta.execute(params![META_MODEL_ID, model_id])?;
            meta.execute(params![META_DIMENSION, dimension.to_string()])?;
            meta.execute(params![META_RECORD_COUNT, records.len().to_string()])?;
            meta.execute(params![META_BUILT_AT, chrono::Utc::now().to_rfc3339()])?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Load all records in position order, checking them against the stored
    /// metadata and against the embedder that will query them.
    pub fn load_records(
        &self,
        expected_model_id: &str,
        expected_dimension: usize,
    ) -> Result<Vec<EmbeddingRecord>> {
        let mismatch = |msg: String| RetrievalError::ArtifactMismatch(msg);

        let model_id = self
            .get_meta(META_MODEL_ID)?
            .ok_or_else(|| mismatch("index metadata lacks a model id".to_string()))?;
        if model_id != expected_model_id {
            return Err(mismatch(format!(
                "index was built with model '{}', current model is '{}'",
                model_id, expected_model_id
            )));
        }

        let dimension = self.meta_usize(META_DIMENSION)?;
        if dimension != expected_dimension {
            return Err(mismatch(format!(
                "index vectors have {} dimensions, model produces {}",
                dimension, expected_dimension
            )));
        }
        let record_count = self.meta_usize(META_RECORD_COUNT)?;

        let mut stmt = self
            .conn
            .prepare("SELECT position, chunk_id, text, embedding FROM records ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            let position: i64 = row.get(0)?;
            let chunk_id: i64 = row.get(1)?;
            let text: String = row.get(2)?;
            let blob: Vec<u8> = row.get(3)?;
            Ok((position, chunk_id, text, blob))
        })?;

        let mut records = Vec::with_capacity(record_count);
        for (expected_position, row) in rows.enumerate() {
            let (position, chunk_id, text, blob) = row?;
            if position != expected_position as i64 {
                return Err(mismatch(format!(
                    "record positions are not contiguous: expected {}, found {}",
                    expected_position, position
                )));
            }
            if blob.len() != dimension * 4 {
                return Err(mismatch(format!(
                    "chunk {} stores {} bytes of embedding, expected {}",
                    chunk_id,
                    blob.len(),
                    dimension * 4
                )));
            }
            records.push(EmbeddingRecord {
                chunk_id: chunk_id as usize,
                vector: blob_to_embedding(&blob),
                text,
            });
        }

        if records.len() != record_count {
            return Err(mismatch(format!(
                "metadata lists {} records, found {}",
                record_count,
                records.len()
            )));
        }

        debug!(records = records.len(), dimension, "loaded embedding records");
        Ok(records)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let record_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;

        let built_at = self
            .get_meta(META_BUILT_AT)?
            .and_then(|ts| chrono::DateTime::parse_from_rfc3339(&ts).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc));

        Ok(IndexStats {
            record_count: record_count as usize,
            dimension: self
                .get_meta(META_DIMENSION)?
                .and_then(|v| v.parse().ok()),
            model_id: self.get_meta(META_MODEL_ID)?,
            built_at,
        })
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| e.into())
    }

    fn meta_usize(&self, key: &str) -> Result<usize> {
        self.get_meta(key)?
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                RetrievalError::ArtifactMismatch(format!("index metadata '{}' is missing or invalid", key))
            })
    }
}

/// Write a complete index to `db_path`.
///
/// The database is built at a temporary sibling path and renamed into place,
/// so a reader of `db_path` sees either the previous index or the new one.
pub fn write_index(
    db_path: &Path,
    records: &[EmbeddingRecord],
    model_id: &str,
    dimension: usize,
) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(db_path);
    let written = VectorDB::create(&tmp_path)
        .and_then(|mut db| db.replace_all(records, model_id, dimension));
    if let Err(e) = written {
        // The connection is closed by now; drop the partial file.
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, db_path)?;

    info!(path = %db_path.display(), records = records.len(), "index written");
    Ok(())
}

fn temp_path(db_path: &Path) -> PathBuf {
    let mut name = db_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    db_path.with_file_name(name)
}

/// Convert f32 embedding to BLOB
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

/// Convert BLOB to f32 embedding. Callers check the length is a multiple of 4.
fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
