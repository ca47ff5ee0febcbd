//! MCP Server for the textbook
//!
//! Exposes semantic passage search to MCP clients over stdio.

mod server;

pub use server::run_mcp_server;
