//! Textbook MCP Server implementation

use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use textbook_search::{QueryResult, SearchEngine, VectorDB};

/// Parameters for textbook_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// The user's question, verbatim (e.g., "¿Qué es un agente racional?")
    #[schemars(description = "Natural language question about the textbook, as the user asked it")]
    pub question: String,
}

/// Search response for JSON output
#[derive(Debug, Serialize)]
struct SearchResponseJson<'a> {
    question: &'a str,
    found: bool,
    results: &'a [QueryResult],
}

/// Textbook MCP Service
#[derive(Clone)]
pub struct TextbookService {
    engine: Arc<SearchEngine>,
    index_path: PathBuf,
    tool_router: ToolRouter<Self>,
}

impl TextbookService {
    pub fn new(engine: Arc<SearchEngine>, index_path: PathBuf) -> Self {
        Self {
            engine,
            index_path,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl TextbookService {
    /// Search the textbook for passages relevant to a question
    #[tool(description = "Search the textbook for the passages most relevant to a question. Returns up to top_k passages with chunk id and cosine similarity, or a single entry with id null when nothing relevant was found.")]
    async fn textbook_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let question = params.0.question;

        let results = self.engine.search(&question).map_err(|e| {
            McpError::internal_error(format!("Search failed: {}", e), None)
        })?;

        let response = SearchResponseJson {
            question: &question,
            found: results.iter().any(QueryResult::is_match),
            results: &results,
        };

        let output = serde_json::to_string_pretty(&response).map_err(|e| {
            McpError::internal_error(format!("JSON serialization failed: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    /// Describe the loaded index
    #[tool(description = "Get the status of the loaded textbook index: passage count, embedding model, build time and search settings.")]
    async fn textbook_index_status(&self) -> Result<CallToolResult, McpError> {
        let stats = VectorDB::open(&self.index_path)
            .and_then(|db| db.stats())
            .map_err(|e| McpError::internal_error(format!("Failed to read index: {}", e), None))?;

        let settings = self.engine.settings();
        let output = serde_json::json!({
            "passages_loaded": self.engine.passage_count(),
            "passages_on_disk": stats.record_count,
            "model": stats.model_id,
            "dimension": stats.dimension,
            "built_at": stats.built_at.map(|dt| dt.to_rfc3339()),
            "top_k": settings.top_k,
            "similarity_threshold": settings.similarity_threshold,
        });

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&output).unwrap_or_default(),
        )]))
    }
}

#[tool_handler]
impl ServerHandler for TextbookService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Textbook retrieval server. Answers questions with verbatim passages from the book; it never generates text. Pass the user's full question to textbook_search.".to_string()
            ),
            ..Default::default()
        }
    }
}

/// Run the MCP server over stdio with an engine loaded by the caller.
pub async fn run_mcp_server(engine: Arc<SearchEngine>, index_path: PathBuf) -> Result<()> {
    use tokio::io::{stdin, stdout};

    info!(passages = engine.passage_count(), "starting MCP server");
    let service = TextbookService::new(engine, index_path);
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
