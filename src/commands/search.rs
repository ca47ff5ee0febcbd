//! Search command - find the textbook passages closest to a question

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use textbook_search::{Embedder, QueryResult, SearchEngine, SearchSettings};

use super::Workspace;

pub struct SearchArgs {
    pub question: String,
    pub top_k: Option<usize>,
    pub threshold: Option<f32>,
    pub json: bool,
}

/// Run search command
pub fn run(mut workspace: Workspace, args: SearchArgs) -> Result<()> {
    if let Some(top_k) = args.top_k {
        workspace.config.search.top_k = top_k;
    }
    if let Some(threshold) = args.threshold {
        workspace.config.search.similarity_threshold = threshold;
    }
    workspace.validate()?;

    let embedder: Arc<dyn Embedder> = Arc::new(workspace.embedder());
    let settings = SearchSettings::from_config(&workspace.config);
    let index_path = &workspace.paths.index;

    let engine = SearchEngine::load(index_path, settings, embedder).with_context(|| {
        format!(
            "Failed to load index from {} (run `textbook index` first)",
            index_path.display()
        )
    })?;

    let results = engine.search(&args.question)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    print_results(&args.question, &results, engine.settings().similarity_threshold);
    Ok(())
}

fn print_results(question: &str, results: &[QueryResult], threshold: f32) {
    let matches: Vec<&QueryResult> = results.iter().filter(|r| r.is_match()).collect();

    if matches.is_empty() {
        for result in results {
            println!("{}", result.chunk().yellow());
        }
        return;
    }

    println!(
        "{} {} passages for: {}",
        "→".dimmed(),
        matches.len(),
        question.cyan()
    );
    println!();

    for (i, result) in matches.iter().enumerate() {
        let similarity = result.similarity();
        let score_str = format!("{:.3}", similarity);
        let score_colored = if similarity >= 0.8 {
            score_str.green()
        } else if similarity >= threshold.max(0.6) {
            score_str.yellow()
        } else {
            score_str.dimmed()
        };

        let id = result
            .id()
            .map(|id| format!("chunk {}", id))
            .unwrap_or_default();

        println!(
            "{}. [{}] {}",
            (i + 1).to_string().bold(),
            score_colored,
            id.cyan()
        );
        println!("   {}", result.chunk());
        println!();
    }
}
