//! Chunk command - split the extracted textbook into retrievable passages

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use textbook_search::{chunk_text, write_chunks, Chunk};

use super::Workspace;

pub struct ChunkArgs {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub max_chars: Option<usize>,
    pub overlap: Option<usize>,
    pub json: bool,
}

pub fn run(mut workspace: Workspace, args: ChunkArgs) -> Result<()> {
    if let Some(max_chars) = args.max_chars {
        workspace.config.chunking.max_chars = max_chars;
    }
    if let Some(overlap) = args.overlap {
        workspace.config.chunking.overlap_sentences = overlap;
    }
    workspace.validate()?;

    let input = args.input.unwrap_or_else(|| workspace.paths.corpus.clone());
    let output = args.output.unwrap_or_else(|| workspace.paths.chunks.clone());
    let settings = &workspace.config.chunking;

    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read corpus text from {}", input.display()))?;

    let chunks = Chunk::sequence(chunk_text(&text, settings.max_chars, settings.overlap_sentences));
    write_chunks(&output, &chunks)
        .with_context(|| format!("Failed to write chunks to {}", output.display()))?;

    let oversized = chunks
        .iter()
        .filter(|c| c.text.chars().count() > settings.max_chars)
        .count();
    info!(chunks = chunks.len(), oversized, path = %output.display(), "wrote chunk file");

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "chunks": chunks.len(),
                "oversized": oversized,
                "max_chars": settings.max_chars,
                "overlap_sentences": settings.overlap_sentences,
                "output": output.display().to_string(),
            })
        );
    } else {
        println!(
            "{} Generated {} chunks from {}",
            "✓".green().bold(),
            chunks.len().to_string().cyan(),
            input.display()
        );
        if oversized > 0 {
            println!(
                "  {} {} chunks exceed {} chars (sentences are never split)",
                "→".dimmed(),
                oversized,
                settings.max_chars
            );
        }
        println!("  {} Saved to: {}", "→".dimmed(), output.display());
    }

    Ok(())
}
