mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::chunk::ChunkArgs;
use commands::index::IndexArgs;
use commands::search::SearchArgs;
use commands::Workspace;

#[derive(Parser)]
#[command(name = "textbook")]
#[command(about = "Semantic passage search over a textbook", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, default_value = textbook_search::core::paths::DEFAULT_CONFIG_FILE, help = "Config file (YAML)")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and create the data directory
    Init {
        #[arg(long, help = "Overwrite an existing config file")]
        force: bool,
    },
    /// Split the extracted textbook text into overlapping chunks
    Chunk {
        #[arg(long, help = "Corpus text file (default: <data_dir>/corpus.txt)")]
        input: Option<PathBuf>,
        #[arg(long, help = "Chunk file to write (default: <data_dir>/chunks.txt)")]
        output: Option<PathBuf>,
        #[arg(long, help = "Soft character budget per chunk")]
        max_chars: Option<usize>,
        #[arg(long, help = "Sentences repeated between consecutive chunks")]
        overlap: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Build the embedding index from the chunk file
    Index {
        #[arg(long, help = "Show index status only")]
        status: bool,
        #[arg(long, help = "Chunk file to index (default: <data_dir>/chunks.txt)")]
        input: Option<PathBuf>,
        #[arg(long, help = "Skip chunks shorter than this many characters")]
        min_chars: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Find the passages most relevant to a question
    #[command(alias = "ask")]
    Search {
        question: String,
        #[arg(long, short = 'k', help = "Candidates considered before filtering")]
        top_k: Option<usize>,
        #[arg(long, short, help = "Minimum cosine similarity (0-1)")]
        threshold: Option<f32>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== MCP Server =====
    /// Start MCP server for AI assistants
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show client configuration instructions")]
        install: bool,
    },
}

fn init_logging() {
    // stderr keeps stdout free for JSON output and the MCP transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => commands::init::run(&cli.config, force),
        Commands::Chunk {
            input,
            output,
            max_chars,
            overlap,
            json,
        } => commands::chunk::run(
            Workspace::load(&cli.config)?,
            ChunkArgs {
                input,
                output,
                max_chars,
                overlap,
                json,
            },
        ),
        Commands::Index {
            status,
            input,
            min_chars,
            json,
        } => commands::index::run(
            Workspace::load(&cli.config)?,
            IndexArgs {
                status,
                input,
                min_chars,
                json,
            },
        ),
        Commands::Search {
            question,
            top_k,
            threshold,
            json,
        } => commands::search::run(
            Workspace::load(&cli.config)?,
            SearchArgs {
                question,
                top_k,
                threshold,
                json,
            },
        ),

        // MCP Server
        #[cfg(feature = "mcp")]
        Commands::Mcp { install } => {
            if install {
                print_mcp_install_instructions(&cli.config);
                Ok(())
            } else {
                run_mcp_server(&cli.config)
            }
        }
    }
}

#[cfg(feature = "mcp")]
fn run_mcp_server(config_path: &std::path::Path) -> anyhow::Result<()> {
    use anyhow::Context;
    use std::sync::Arc;
    use textbook_search::{Embedder, SearchEngine, SearchSettings};

    let workspace = Workspace::load(config_path)?;
    workspace.validate()?;

    // Loaded once; every tool call shares it.
    let embedder: Arc<dyn Embedder> = Arc::new(workspace.embedder());
    let settings = SearchSettings::from_config(&workspace.config);
    let engine = SearchEngine::load(&workspace.paths.index, settings, embedder)
        .with_context(|| {
            format!(
                "Failed to load index from {}",
                workspace.paths.index.display()
            )
        })?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::run_mcp_server(
        Arc::new(engine),
        workspace.paths.index.clone(),
    ))
}

#[cfg(feature = "mcp")]
fn print_mcp_install_instructions(config_path: &std::path::Path) {
    use colored::Colorize;

    let work_dir = std::env::current_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "/path/to/your/project".to_string());

    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "textbook".to_string());

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your MCP client configuration:");
    println!();
    println!(r#"{{
  "mcpServers": {{
    "textbook-search": {{
      "command": "{}",
      "args": ["--config", "{}", "mcp"],
      "cwd": "{}"
    }}
  }}
}}"#, binary_path, config_path.display(), work_dir);
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - Passages most relevant to a question", "textbook_search".green());
    println!("  • {} - Loaded index and search settings", "textbook_index_status".green());
}
