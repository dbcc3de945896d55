//! Async wrapper around the synchronous file repository.
//!
//! File I/O and the writer lock both block, so every call is moved onto
//! tokio's blocking thread pool with `tokio::task::spawn_blocking`.

use super::file_phonebook_repository::FilePhonebookRepository;
use super::traits::PhonebookRepository;
use crate::error::{PhonebookError, PhonebookResult};
use crate::models::*;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinError;

fn join_error(e: JoinError) -> PhonebookError {
    PhonebookError::TaskJoin(format!("Task join error: {}", e))
}

/// Async facade over [`FilePhonebookRepository`].
#[derive(Clone)]
pub struct AsyncFilePhonebookRepository {
    inner: Arc<FilePhonebookRepository>,
}

impl AsyncFilePhonebookRepository {
    pub fn new(repository: FilePhonebookRepository) -> Self {
        Self {
            inner: Arc::new(repository),
        }
    }

    /// The wrapped synchronous repository.
    pub fn inner(&self) -> &FilePhonebookRepository {
        &self.inner
    }
}

#[async_trait]
impl PhonebookRepository for AsyncFilePhonebookRepository {
    async fn list_contacts(
        &self,
        group: Option<&str>,
        search: Option<&str>,
    ) -> PhonebookResult<Vec<ContactEntry>> {
        let repo = self.inner.clone();
        let group = group.map(str::to_string);
        let search = search.map(str::to_string);

        tokio::task::spawn_blocking(move || {
            repo.list_contacts(group.as_deref(), search.as_deref())
        })
        .await
        .map_err(join_error)?
    }

    async fn list_groups(&self) -> PhonebookResult<Vec<GroupSummary>> {
        let repo = self.inner.clone();

        tokio::task::spawn_blocking(move || repo.list_groups())
            .await
            .map_err(join_error)?
    }

    async fn add_or_edit_contact(
        &self,
        group: &str,
        contact: &Contact,
        existing_position: Option<usize>,
    ) -> PhonebookResult<ContactEntry> {
        let repo = self.inner.clone();
        let group = group.to_string();
        let contact = contact.clone();

        tokio::task::spawn_blocking(move || {
            repo.add_or_edit_contact(&group, contact, existing_position)
        })
        .await
        .map_err(join_error)?
    }

    async fn move_contact(
        &self,
        from_group: &str,
        position: usize,
        to_group: &str,
    ) -> PhonebookResult<ContactEntry> {
        let repo = self.inner.clone();
        let from_group = from_group.to_string();
        let to_group = to_group.to_string();

        tokio::task::spawn_blocking(move || repo.move_contact(&from_group, position, &to_group))
            .await
            .map_err(join_error)?
    }

    async fn delete_contact(&self, group: &str, position: usize) -> PhonebookResult<Contact> {
        let repo = self.inner.clone();
        let group = group.to_string();

        tokio::task::spawn_blocking(move || repo.delete_contact(&group, position))
            .await
            .map_err(join_error)?
    }

    async fn rename_group(&self, old_name: &str, new_name: &str) -> PhonebookResult<()> {
        let repo = self.inner.clone();
        let old_name = old_name.to_string();
        let new_name = new_name.to_string();

        tokio::task::spawn_blocking(move || repo.rename_group(&old_name, &new_name))
            .await
            .map_err(join_error)?
    }

    async fn delete_group(&self, name: &str, cascade: bool) -> PhonebookResult<Group> {
        let repo = self.inner.clone();
        let name = name.to_string();

        tokio::task::spawn_blocking(move || repo.delete_group(&name, cascade))
            .await
            .map_err(join_error)?
    }

    async fn reorder_groups(&self, order: &[String]) -> PhonebookResult<Vec<GroupSummary>> {
        let repo = self.inner.clone();
        let order = order.to_vec();

        tokio::task::spawn_blocking(move || repo.reorder_groups(&order))
            .await
            .map_err(join_error)?
    }

    async fn import_spreadsheet(&self, bytes: &[u8]) -> PhonebookResult<ImportReport> {
        let repo = self.inner.clone();
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || repo.import_spreadsheet(&bytes))
            .await
            .map_err(join_error)?
    }

    async fn export_spreadsheet(&self) -> PhonebookResult<Vec<u8>> {
        let repo = self.inner.clone();

        tokio::task::spawn_blocking(move || repo.export_spreadsheet())
            .await
            .map_err(join_error)?
    }

    async fn raw_file_bytes(&self) -> PhonebookResult<Vec<u8>> {
        let repo = self.inner.clone();

        tokio::task::spawn_blocking(move || repo.raw_file_bytes())
            .await
            .map_err(join_error)?
    }

    async fn storage_directory(&self) -> PhonebookResult<PathBuf> {
        let repo = self.inner.clone();

        tokio::task::spawn_blocking(move || repo.storage_directory())
            .await
            .map_err(join_error)?
    }

    async fn set_storage_directory(&self, path: &Path) -> PhonebookResult<()> {
        let repo = self.inner.clone();
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || repo.set_storage_directory(&path))
            .await
            .map_err(join_error)?
    }
}
