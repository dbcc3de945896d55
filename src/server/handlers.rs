//! MCP tool handlers for the phonebook server.
//!
//! This module implements all the MCP tools using the rmcp SDK's tool_router pattern.

use crate::error::PhonebookError;
use crate::models::Contact;
use crate::repositories::PhonebookRepository;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

/// MCP server exposing the remote phonebook to assistants.
#[derive(Clone)]
pub struct PhonebookMcpServer {
    repository: Arc<dyn PhonebookRepository>,
    tool_router: ToolRouter<Self>,
}

// Implement ServerHandler using the tool_handler macro
#[tool_handler]
impl ServerHandler for PhonebookMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities {
                tools: Some(Default::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "remote-phonebook".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some("MCP server for a Yealink remote phonebook - manage contacts and groups, and import or export the phonebook as a spreadsheet.".into()),
        }
    }
}

// Helper structs for tool parameters
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListContactsParams {
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    search: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveContactParams {
    group: String,
    name: String,
    #[serde(default)]
    office_number: Option<String>,
    #[serde(default)]
    mobile_number: Option<String>,
    #[serde(default)]
    other_number: Option<String>,
    #[serde(default)]
    photo_ref: Option<String>,
    /// Position of the contact to replace; omit to add a new contact
    #[serde(default)]
    position: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContactRefParams {
    group: String,
    position: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveContactParams {
    from_group: String,
    position: usize,
    to_group: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameGroupParams {
    old_name: String,
    new_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteGroupParams {
    name: String,
    #[serde(default)]
    cascade: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReorderGroupsParams {
    order: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PathParams {
    path: String,
}

// Caller mistakes become INVALID_PARAMS; everything else is INTERNAL_ERROR.
fn to_mcp_error(e: PhonebookError) -> McpError {
    let code = match &e {
        PhonebookError::Format(_)
        | PhonebookError::Validation(_)
        | PhonebookError::Conflict(_)
        | PhonebookError::NotFound(_)
        | PhonebookError::InvalidPath { .. } => ErrorCode::INVALID_PARAMS,
        _ => ErrorCode::INTERNAL_ERROR,
    };
    let data = e
        .is_retryable()
        .then(|| serde_json::json!({ "retryable": true }));
    McpError {
        code,
        message: Cow::from(e.to_string()),
        data,
    }
}

fn internal_error(e: impl std::fmt::Display) -> McpError {
    McpError {
        code: ErrorCode::INTERNAL_ERROR,
        message: Cow::from(e.to_string()),
        data: None,
    }
}

fn json_result(value: &impl serde::Serialize) -> Result<CallToolResult, McpError> {
    let json_response = serde_json::to_string_pretty(value).map_err(internal_error)?;
    Ok(CallToolResult::success(vec![Content::text(json_response)]))
}

// Tool router implementation
#[tool_router]
impl PhonebookMcpServer {
    /// Create a new phonebook MCP server.
    pub fn new(repository: Arc<dyn PhonebookRepository>) -> Self {
        Self {
            repository,
            tool_router: Self::tool_router(),
        }
    }

    /// List contacts, optionally filtered by group and search text.
    #[tool(
        description = "List phonebook contacts in display order. Optionally restrict to one group (exact name) and/or to contacts whose name or any number contains the search text (case-insensitive)."
    )]
    pub async fn list_contacts(
        &self,
        params: Parameters<ListContactsParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;

        let entries = self
            .repository
            .list_contacts(params.group.as_deref(), params.search.as_deref())
            .await
            .map_err(to_mcp_error)?;

        json_result(&serde_json::json!({
            "result_count": entries.len(),
            "contacts": entries,
        }))
    }

    /// List groups with their contact counts.
    #[tool(description = "List phonebook groups in display order with their contact counts")]
    pub async fn list_groups(&self) -> Result<CallToolResult, McpError> {
        let groups = self
            .repository
            .list_groups()
            .await
            .map_err(to_mcp_error)?;

        json_result(&groups)
    }

    /// Add a new contact or replace an existing one.
    #[tool(
        description = "Add a contact to a group (the group is created if needed), or replace the contact at the given position. At least one number is required."
    )]
    pub async fn save_contact(
        &self,
        params: Parameters<SaveContactParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;

        tracing::info!("MCP Handler: save_contact called");
        tracing::debug!(
            "Parameters: group={}, name={}, position={:?}",
            params.group,
            params.name,
            params.position
        );

        let contact = Contact {
            name: params.name,
            office_number: params.office_number.unwrap_or_default(),
            mobile_number: params.mobile_number.unwrap_or_default(),
            other_number: params.other_number.unwrap_or_default(),
            photo_ref: params.photo_ref.unwrap_or_default(),
        };

        let entry = self
            .repository
            .add_or_edit_contact(&params.group, &contact, params.position)
            .await
            .map_err(|e| {
                tracing::error!("Failed to save contact: {:?}", e);
                to_mcp_error(e)
            })?;

        json_result(&entry)
    }

    /// Delete one contact.
    #[tool(
        description = "Delete the contact at a position in a group. A group left without contacts is removed."
    )]
    pub async fn delete_contact(
        &self,
        params: Parameters<ContactRefParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;

        let removed = self
            .repository
            .delete_contact(&params.group, params.position)
            .await
            .map_err(to_mcp_error)?;

        json_result(&serde_json::json!({ "deleted": removed }))
    }

    /// Move a contact between groups.
    #[tool(
        description = "Move a contact to the end of another group, creating that group if needed"
    )]
    pub async fn move_contact(
        &self,
        params: Parameters<MoveContactParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;

        let entry = self
            .repository
            .move_contact(&params.from_group, params.position, &params.to_group)
            .await
            .map_err(to_mcp_error)?;

        json_result(&entry)
    }

    /// Rename a group.
    #[tool(description = "Rename a group, keeping its position and contacts")]
    pub async fn rename_group(
        &self,
        params: Parameters<RenameGroupParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;

        self.repository
            .rename_group(&params.old_name, &params.new_name)
            .await
            .map_err(to_mcp_error)?;

        json_result(&serde_json::json!({
            "old_name": params.old_name,
            "new_name": params.new_name.trim(),
        }))
    }

    /// Delete a group.
    #[tool(
        description = "Delete a group. A group that still has contacts is only deleted when cascade is true."
    )]
    pub async fn delete_group(
        &self,
        params: Parameters<DeleteGroupParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;

        let removed = self
            .repository
            .delete_group(&params.name, params.cascade.unwrap_or(false))
            .await
            .map_err(to_mcp_error)?;

        json_result(&serde_json::json!({
            "deleted_group": removed.name,
            "deleted_contacts": removed.len(),
        }))
    }

    /// Reorder groups.
    #[tool(
        description = "Move the named groups to the front in the given order; other groups keep their relative order after them"
    )]
    pub async fn reorder_groups(
        &self,
        params: Parameters<ReorderGroupsParams>,
    ) -> Result<CallToolResult, McpError> {
        let groups = self
            .repository
            .reorder_groups(&params.0.order)
            .await
            .map_err(to_mcp_error)?;

        json_result(&groups)
    }

    /// Import a spreadsheet file from the server's filesystem.
    #[tool(
        description = "Replace the whole phonebook with the contents of an .xls or .xlsx file at the given path. Rows without any number are skipped; any other invalid row aborts the import."
    )]
    pub async fn import_spreadsheet(
        &self,
        params: Parameters<PathParams>,
    ) -> Result<CallToolResult, McpError> {
        let path = PathBuf::from(params.0.path);

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| to_mcp_error(PhonebookError::io(&path, source)))?;

        let report = self
            .repository
            .import_spreadsheet(&bytes)
            .await
            .map_err(|e| {
                tracing::error!("Failed to import {}: {:?}", path.display(), e);
                to_mcp_error(e)
            })?;

        json_result(&report)
    }

    /// Export the phonebook to a spreadsheet file.
    #[tool(description = "Write the phonebook as an .xlsx file to the given path")]
    pub async fn export_spreadsheet(
        &self,
        params: Parameters<PathParams>,
    ) -> Result<CallToolResult, McpError> {
        let path = PathBuf::from(params.0.path);

        let bytes = self
            .repository
            .export_spreadsheet()
            .await
            .map_err(to_mcp_error)?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| to_mcp_error(PhonebookError::io(&path, source)))?;

        json_result(&serde_json::json!({
            "path": path,
            "bytes": bytes.len(),
        }))
    }

    /// Return the phonebook file as served to phones.
    #[tool(description = "Return the phonebook XML exactly as served to the phones")]
    pub async fn get_phonebook_xml(&self) -> Result<CallToolResult, McpError> {
        let bytes = self
            .repository
            .raw_file_bytes()
            .await
            .map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![Content::text(
            String::from_utf8_lossy(&bytes).into_owned(),
        )]))
    }

    /// Current storage directory.
    #[tool(description = "Show the directory that holds the phonebook file")]
    pub async fn get_storage_directory(&self) -> Result<CallToolResult, McpError> {
        let directory = self
            .repository
            .storage_directory()
            .await
            .map_err(to_mcp_error)?;

        json_result(&serde_json::json!({ "directory": directory }))
    }

    /// Switch the storage directory.
    #[tool(
        description = "Use another directory for the phonebook file. The directory is created and an empty phonebook is written there if none exists."
    )]
    pub async fn set_storage_directory(
        &self,
        params: Parameters<PathParams>,
    ) -> Result<CallToolResult, McpError> {
        let path = PathBuf::from(params.0.path);

        self.repository
            .set_storage_directory(&path)
            .await
            .map_err(to_mcp_error)?;

        tracing::info!("Storage directory set to {}", path.display());
        json_result(&serde_json::json!({ "directory": path }))
    }
}
