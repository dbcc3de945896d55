use crate::error::PhonebookResult;
use crate::models::*;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Repository for managing the remote phonebook.
///
/// Provides abstraction over phonebook storage so the tool server can be
/// driven by the file-backed implementation or a test double.
#[async_trait]
pub trait PhonebookRepository: Send + Sync {
    /// List contacts, optionally filtered by exact group and by a
    /// case-insensitive substring of name or numbers.
    async fn list_contacts(
        &self,
        group: Option<&str>,
        search: Option<&str>,
    ) -> PhonebookResult<Vec<ContactEntry>>;

    /// List groups in display order with contact counts.
    async fn list_groups(&self) -> PhonebookResult<Vec<GroupSummary>>;

    /// Add a contact, or replace the one at `existing_position`.
    async fn add_or_edit_contact(
        &self,
        group: &str,
        contact: &Contact,
        existing_position: Option<usize>,
    ) -> PhonebookResult<ContactEntry>;

    /// Move a contact to another group.
    async fn move_contact(
        &self,
        from_group: &str,
        position: usize,
        to_group: &str,
    ) -> PhonebookResult<ContactEntry>;

    /// Delete a contact.
    async fn delete_contact(&self, group: &str, position: usize) -> PhonebookResult<Contact>;

    /// Rename a group.
    async fn rename_group(&self, old_name: &str, new_name: &str) -> PhonebookResult<()>;

    /// Delete a group, with its contacts when `cascade` is set.
    async fn delete_group(&self, name: &str, cascade: bool) -> PhonebookResult<Group>;

    /// Reorder groups by name.
    async fn reorder_groups(&self, order: &[String]) -> PhonebookResult<Vec<GroupSummary>>;

    /// Replace the phonebook with spreadsheet contents.
    async fn import_spreadsheet(&self, bytes: &[u8]) -> PhonebookResult<ImportReport>;

    /// Export the phonebook as spreadsheet bytes.
    async fn export_spreadsheet(&self) -> PhonebookResult<Vec<u8>>;

    /// Raw bytes of the stored phonebook file.
    async fn raw_file_bytes(&self) -> PhonebookResult<Vec<u8>>;

    /// Directory currently holding the phonebook file.
    async fn storage_directory(&self) -> PhonebookResult<PathBuf>;

    /// Switch to another storage directory.
    async fn set_storage_directory(&self, path: &Path) -> PhonebookResult<()>;
}
