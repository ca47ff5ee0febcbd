//! Index command - Build the embedding index from the chunk file

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use textbook_search::search::embedding::Embedder;
use textbook_search::{build, read_chunks, write_index, RetrievalError, VectorDB};

use super::Workspace;

pub struct IndexArgs {
    pub status: bool,
    pub input: Option<PathBuf>,
    pub min_chars: Option<usize>,
    pub json: bool,
}

/// Run index command
pub fn run(mut workspace: Workspace, args: IndexArgs) -> Result<()> {
    if args.status {
        return show_status(&workspace.paths.index, args.json);
    }

    if let Some(min_chars) = args.min_chars {
        workspace.config.indexing.min_chars = min_chars;
    }
    workspace.validate()?;

    let chunks_path = args.input.unwrap_or_else(|| workspace.paths.chunks.clone());
    let index_path = workspace.paths.index.clone();
    let settings = &workspace.config.indexing;

    let parsed = read_chunks(&chunks_path)
        .with_context(|| format!("Failed to read chunks from {}", chunks_path.display()))?;

    if !args.json {
        println!(
            "{} Loaded {} chunks from {}",
            "→".dimmed(),
            parsed.chunks.len(),
            chunks_path.display()
        );
        for skipped in &parsed.skipped {
            println!("  {} {}", "!".yellow(), skipped);
        }
        println!("{} Building search index...", "→".dimmed());
    }

    let embedder = workspace.embedder();
    let built = match build(&parsed.chunks, settings.min_chars, &embedder, settings.batch_size) {
        Err(RetrievalError::EmptyCorpus { min_chars }) => {
            anyhow::bail!(
                "No chunks in {} have at least {} characters; nothing to index",
                chunks_path.display(),
                min_chars
            )
        }
        other => other?,
    };

    write_index(&index_path, &built.records, &embedder.model_id(), embedder.dimension())
        .with_context(|| format!("Failed to write index to {}", index_path.display()))?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "indexed": built.records.len(),
                "filtered": built.filtered,
                "malformed": parsed.skipped.len(),
                "dimension": embedder.dimension(),
                "model": embedder.model_id(),
                "duration_ms": built.duration_ms,
                "path": index_path.display().to_string(),
            })
        );
    } else {
        println!();
        println!(
            "{} Indexed {} chunks in {:.2}s",
            "✓".green().bold(),
            built.records.len().to_string().cyan(),
            built.duration_ms as f64 / 1000.0
        );
        if built.filtered > 0 {
            println!(
                "  {} {} chunks skipped (shorter than {} chars)",
                "→".dimmed(),
                built.filtered,
                settings.min_chars
            );
        }
        if !parsed.skipped.is_empty() {
            println!(
                "  {} {} malformed blocks skipped",
                "✗".red(),
                parsed.skipped.len()
            );
        }
        println!("  {} Index saved to: {}", "→".dimmed(), index_path.display());
    }

    Ok(())
}

/// Show index status
fn show_status(db_path: &Path, json: bool) -> Result<()> {
    if !db_path.exists() {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "exists": false,
                    "error": "Index not found"
                })
            );
        } else {
            println!(
                "{} Index not found. Run {} first.",
                "!".yellow().bold(),
                "textbook index".cyan()
            );
        }
        return Ok(());
    }

    let db = VectorDB::open(db_path)?;
    let stats = db.stats()?;

    let file_size = std::fs::metadata(db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "exists": true,
                "record_count": stats.record_count,
                "dimension": stats.dimension,
                "model": stats.model_id,
                "built_at": stats.built_at.map(|dt| dt.to_rfc3339()),
                "file_size_bytes": file_size,
            })
        );
    } else {
        println!("{}", "Index Status".bold());
        println!();
        println!(
            "  {} {} passages indexed",
            "→".dimmed(),
            stats.record_count.to_string().cyan()
        );
        if let (Some(model), Some(dimension)) = (&stats.model_id, stats.dimension) {
            println!("  {} Model: {} ({} dims)", "→".dimmed(), model, dimension);
        }
        println!(
            "  {} Size: {:.2} KB",
            "→".dimmed(),
            file_size as f64 / 1024.0
        );
        if let Some(built_at) = stats.built_at {
            println!(
                "  {} Built: {}",
                "→".dimmed(),
                built_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    Ok(())
}
