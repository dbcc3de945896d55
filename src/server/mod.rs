//! MCP server for the remote phonebook.
//!
//! This module provides the MCP protocol server that exposes phonebook
//! management to AI assistants through the Model Context Protocol.

pub mod handlers;

pub use handlers::PhonebookMcpServer;

use anyhow::Result;
use rmcp::transport::io::stdio;
use rmcp::ServiceExt;

/// Run the phonebook MCP server with stdio transport.
///
/// Communicates via stdin/stdout using the MCP protocol and returns when
/// the client disconnects.
pub async fn run_server(server: PhonebookMcpServer) -> Result<()> {
    let service = server.serve(stdio()).await?;

    service.waiting().await?;

    Ok(())
}
