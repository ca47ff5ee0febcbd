use anyhow::Result;
use colored::*;
use std::fs;
use std::path::Path;

use textbook_search::RetrievalConfig;

use super::Workspace;

pub fn run(config_path: &Path, force: bool) -> Result<()> {
    println!("{}", "Textbook Search Setup".bold());
    println!("{}", "=".repeat(50));
    println!();

    let config = if config_path.exists() && !force {
        println!(
            "{} {} exists (use --force to overwrite)",
            "✓".green(),
            config_path.display()
        );
        RetrievalConfig::load(config_path)?
    } else {
        let config = RetrievalConfig::default();
        fs::write(config_path, config.to_yaml()?)?;
        println!("{} Wrote default config to {}", "✓".green(), config_path.display());
        config
    };

    let workspace = Workspace::from_config(config);
    let paths = &workspace.paths;

    if paths.data_dir.exists() {
        println!("{} {} exists", "✓".green(), paths.data_dir.display());
    } else {
        fs::create_dir_all(&paths.data_dir)?;
        println!("{} Created {}", "✓".green(), paths.data_dir.display());
    }

    println!();
    let steps = [
        (&paths.corpus, "extracted textbook text", "place the extracted text here"),
        (&paths.chunks, "chunk file", "run `textbook chunk`"),
        (&paths.index, "embedding index", "run `textbook index`"),
    ];
    for (path, what, hint) in steps {
        if path.exists() {
            println!("{} {} ({})", "✓".green(), path.display(), what);
        } else {
            println!("{} {} missing ({}): {}", "→".dimmed(), path.display(), what, hint.yellow());
        }
    }

    Ok(())
}
