//! Chunk file format
//!
//! The hand-off between chunking and indexing is a UTF-8 text file:
//!
//! ```text
//! --- CHUNK 1 ---
//! First chunk text.
//!
//! --- CHUNK 2 ---
//! Second chunk text.
//! ```
//!
//! Parsing is lenient. A block whose header is malformed, whose id repeats an
//! earlier one, or whose body is empty is skipped and reported; the rest of the
//! file still loads.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::warn;

use super::chunker::Chunk;
use super::error::{CorpusFormatError, Result};

const HEADER_PREFIX: &str = "--- CHUNK ";
const HEADER_SUFFIX: &str = "---";

/// Chunks read from a chunk file, plus the blocks that had to be skipped.
#[derive(Debug, Default)]
pub struct ParsedChunks {
    pub chunks: Vec<Chunk>,
    pub skipped: Vec<CorpusFormatError>,
}

/// Render chunks in the chunk file format.
pub fn render_chunks(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        let _ = write!(out, "{}{} {}\n{}\n\n", HEADER_PREFIX, chunk.id, HEADER_SUFFIX, chunk.text);
    }
    out
}

/// Write chunks to `path`, replacing any existing file.
pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("txt.tmp");
    fs::write(&tmp_path, render_chunks(chunks))?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read and parse a chunk file.
pub fn read_chunks(path: &Path) -> Result<ParsedChunks> {
    let content = fs::read_to_string(path)?;
    let parsed = parse_chunks(&content);
    for error in &parsed.skipped {
        warn!(path = %path.display(), block = error.block, reason = %error.reason, "skipped chunk block");
    }
    Ok(parsed)
}

/// Parse chunk file content.
pub fn parse_chunks(content: &str) -> ParsedChunks {
    let mut parsed = ParsedChunks::default();
    let mut seen: HashSet<usize> = HashSet::new();

    for (ordinal, block) in split_blocks(content).into_iter().enumerate() {
        let block_no = ordinal + 1;
        let reject = |reason: String| CorpusFormatError { block: block_no, reason };

        let id = match parse_header(block.header) {
            Some(id) => id,
            None => {
                parsed
                    .skipped
                    .push(reject(format!("malformed header {:?}", block.header.trim())));
                continue;
            }
        };

        let text = block.body.join("\n").trim().to_string();
        if text.is_empty() {
            parsed.skipped.push(reject(format!("chunk {} has no text", id)));
            continue;
        }

        if !seen.insert(id) {
            parsed.skipped.push(reject(format!("duplicate chunk id {}", id)));
            continue;
        }

        parsed.chunks.push(Chunk { id, text });
    }

    parsed
}

struct RawBlock<'a> {
    header: &'a str,
    body: Vec<&'a str>,
}

/// Group lines under their `--- CHUNK` header. Text before the first header
/// belongs to no chunk and is dropped.
///
/// After the first block, a header must follow a blank line. A header-like
/// line directly under a header or inside a body is chunk text.
fn split_blocks(content: &str) -> Vec<RawBlock<'_>> {
    let mut blocks: Vec<RawBlock<'_>> = Vec::new();
    let mut after_blank = true;

    for line in content.lines() {
        let opens_block = blocks.is_empty() || after_blank;
        if opens_block && line.starts_with(HEADER_PREFIX) {
            blocks.push(RawBlock {
                header: line,
                body: Vec::new(),
            });
        } else if let Some(block) = blocks.last_mut() {
            block.body.push(line);
        }
        after_blank = line.trim().is_empty();
    }

    blocks
}

/// `--- CHUNK 12 ---` -> `Some(12)`. Ids are 1-based, so 0 is rejected.
fn parse_header(line: &str) -> Option<usize> {
    let rest = line.strip_prefix(HEADER_PREFIX)?.trim_end();
    let number = rest.strip_suffix(HEADER_SUFFIX)?.trim();
    match number.parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(id) => Some(id),
    }
}
