//! Phonebook repository backed by a single markup file.
//!
//! Every mutation follows the same path: take the writer lock, load the
//! current file, apply the change in memory, validate the result, and
//! replace the file atomically. Reads never take the lock; they always see
//! a complete file because writes go through a rename.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::codec::{markup, spreadsheet, ContactRow};
use crate::config::{Config, UngroupedPolicy};
use crate::domain::{
    apply_emptiness_cleanup, validate_contact, validate_group_name, validate_new_group_name,
    validate_phonebook, ValidationError,
};
use crate::error::{ConflictReason, PhonebookError, PhonebookResult};
use crate::models::{Contact, ContactEntry, Group, GroupSummary, ImportReport, Phonebook};
use crate::storage::{write_atomic, PathLock, StorageLocation};

/// Tunables for [`FilePhonebookRepository`].
#[derive(Debug, Clone)]
pub struct RepositoryOptions {
    /// File name inside the storage directory
    pub file_name: String,

    /// How long a writer waits for the lock before giving up with `Busy`
    pub lock_timeout: Duration,

    /// What import does with rows lacking a department
    pub ungrouped_policy: UngroupedPolicy,
}

impl RepositoryOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            file_name: config.phonebook_filename.clone(),
            lock_timeout: config.lock_timeout(),
            ungrouped_policy: config.ungrouped_policy.clone(),
        }
    }
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// The phonebook file in the directory supplied by a [`StorageLocation`].
///
/// All methods are synchronous and may block on the filesystem or on the
/// writer lock; async callers go through
/// [`AsyncFilePhonebookRepository`](super::AsyncFilePhonebookRepository).
pub struct FilePhonebookRepository {
    location: Arc<dyn StorageLocation>,
    options: RepositoryOptions,
    write_file: WriteFile,
}

/// Replaces the phonebook file with new contents, all or nothing.
type WriteFile = fn(&Path, &[u8]) -> PhonebookResult<()>;

fn contact_not_found(group: &str, position: usize) -> PhonebookError {
    PhonebookError::NotFound(format!(
        "contact at position {} in group '{}'",
        position, group
    ))
}

fn group_not_found(group: &str) -> PhonebookError {
    PhonebookError::NotFound(format!("group '{}'", group))
}

fn load_from(path: &Path) -> PhonebookResult<Phonebook> {
    match fs::read(path) {
        Ok(bytes) => markup::decode(&bytes),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist yet, treating as empty", path.display());
            Ok(Phonebook::new())
        }
        Err(source) => Err(PhonebookError::io(path, source)),
    }
}

impl FilePhonebookRepository {
    pub fn new(location: Arc<dyn StorageLocation>, options: RepositoryOptions) -> Self {
        Self {
            location,
            options,
            write_file: write_atomic,
        }
    }

    pub fn from_config(config: &Config, location: Arc<dyn StorageLocation>) -> Self {
        Self::new(location, RepositoryOptions::from_config(config))
    }

    pub fn options(&self) -> &RepositoryOptions {
        &self.options
    }

    /// Full path of the phonebook file for the current directory.
    pub fn phonebook_path(&self) -> PhonebookResult<PathBuf> {
        Ok(self
            .location
            .current_directory()?
            .join(&self.options.file_name))
    }

    /// Decode the current file. A missing file is an empty phonebook.
    pub fn load(&self) -> PhonebookResult<Phonebook> {
        load_from(&self.phonebook_path()?)
    }

    fn persist(&self, path: &Path, phonebook: &Phonebook) -> PhonebookResult<()> {
        validate_phonebook(phonebook)?;
        (self.write_file)(path, &markup::encode(phonebook))?;
        debug!(
            "Wrote {} ({} groups, {} contacts)",
            path.display(),
            phonebook.group_count(),
            phonebook.contact_count()
        );
        Ok(())
    }

    /// Lock, load, apply `change`, validate, and write back.
    ///
    /// When `change` or validation fails nothing is written.
    fn mutate<T, F>(&self, operation: &str, change: F) -> PhonebookResult<T>
    where
        F: FnOnce(&mut Phonebook) -> PhonebookResult<T>,
    {
        let path = self.phonebook_path()?;
        let _lock = PathLock::acquire(&path, self.options.lock_timeout)?;

        let mut phonebook = load_from(&path)?;
        let outcome = change(&mut phonebook).inspect_err(|err| {
            debug!("{} rejected: {}", operation, err);
        })?;
        self.persist(&path, &phonebook)?;
        Ok(outcome)
    }

    /// Contacts in file order, optionally restricted to one group and/or
    /// to contacts whose name or numbers contain `search`
    /// (case-insensitive). Empty filters are ignored.
    pub fn list_contacts(
        &self,
        group: Option<&str>,
        search: Option<&str>,
    ) -> PhonebookResult<Vec<ContactEntry>> {
        let phonebook = self.load()?;
        let group = group.filter(|g| !g.is_empty());
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        Ok(phonebook
            .entries()
            .filter(|entry| group.map_or(true, |g| entry.group == g))
            .filter(|entry| {
                needle
                    .as_deref()
                    .map_or(true, |n| entry.contact.matches_text(n))
            })
            .collect())
    }

    /// Groups in file order with their contact counts.
    pub fn list_groups(&self) -> PhonebookResult<Vec<GroupSummary>> {
        Ok(self.load()?.summaries())
    }

    /// Append `contact` to `group` (creating the group if needed), or with
    /// `existing_position` replace the contact already there.
    pub fn add_or_edit_contact(
        &self,
        group: &str,
        contact: Contact,
        existing_position: Option<usize>,
    ) -> PhonebookResult<ContactEntry> {
        let group = group.trim().to_string();
        validate_group_name(&group)?;
        let contact = contact.trimmed();
        validate_contact(&contact)?;

        let entry = self.mutate("add_or_edit_contact", |phonebook| match existing_position {
            Some(position) => {
                phonebook
                    .replace_contact(&group, position, contact.clone())
                    .ok_or_else(|| contact_not_found(&group, position))?;
                Ok(ContactEntry {
                    group,
                    position,
                    contact,
                })
            }
            None => {
                if !phonebook.contains_group(&group) {
                    validate_new_group_name(phonebook, &group)?;
                }
                let contacts = phonebook.group_entry(&group);
                contacts.push(contact.clone());
                let position = contacts.len() - 1;
                Ok(ContactEntry {
                    group,
                    position,
                    contact,
                })
            }
        })?;

        info!(
            "Saved contact '{}' in group '{}' at position {}",
            entry.contact.name, entry.group, entry.position
        );
        Ok(entry)
    }

    /// Move a contact to the end of another group, creating that group if
    /// needed and dropping the source group if it ends up empty.
    pub fn move_contact(
        &self,
        from_group: &str,
        position: usize,
        to_group: &str,
    ) -> PhonebookResult<ContactEntry> {
        let to_group = to_group.trim().to_string();
        validate_group_name(&to_group)?;

        let entry = self.mutate("move_contact", |phonebook| {
            let contact = phonebook
                .remove_contact(from_group, position)
                .ok_or_else(|| contact_not_found(from_group, position))?;

            // An existing target keeps its place even if it is the source
            // group and just went empty; a new one counts against the limit
            // only after the source has been cleaned up.
            if !phonebook.contains_group(&to_group) {
                apply_emptiness_cleanup(phonebook);
                validate_new_group_name(phonebook, &to_group)?;
            }
            let contacts = phonebook.group_entry(&to_group);
            contacts.push(contact.clone());
            let position = contacts.len() - 1;
            apply_emptiness_cleanup(phonebook);
            Ok(ContactEntry {
                group: to_group,
                position,
                contact,
            })
        })?;

        info!(
            "Moved contact '{}' from group '{}' to '{}'",
            entry.contact.name, from_group, entry.group
        );
        Ok(entry)
    }

    /// Remove one contact and return it. Groups left empty are removed.
    pub fn delete_contact(&self, group: &str, position: usize) -> PhonebookResult<Contact> {
        let (removed, dropped_groups) = self.mutate("delete_contact", |phonebook| {
            let removed = phonebook
                .remove_contact(group, position)
                .ok_or_else(|| contact_not_found(group, position))?;
            Ok((removed, apply_emptiness_cleanup(phonebook)))
        })?;

        info!("Deleted contact '{}' from group '{}'", removed.name, group);
        if !dropped_groups.is_empty() {
            info!("Removed empty group(s): {}", dropped_groups.join(", "));
        }
        Ok(removed)
    }

    /// Rename a group in place. Renaming a group to its current name is a
    /// no-op and does not touch the file.
    pub fn rename_group(&self, old_name: &str, new_name: &str) -> PhonebookResult<()> {
        let new_name = new_name.trim();
        if old_name == new_name {
            debug!("Group '{}' already has that name", old_name);
            return Ok(());
        }
        validate_group_name(new_name)?;

        self.mutate("rename_group", |phonebook| {
            if !phonebook.contains_group(old_name) {
                return Err(group_not_found(old_name));
            }
            if phonebook.contains_group(new_name) {
                return Err(ValidationError::DuplicateGroupName.into());
            }
            phonebook.rename_group(old_name, new_name);
            Ok(())
        })?;

        info!("Renamed group '{}' to '{}'", old_name, new_name);
        Ok(())
    }

    /// Remove a group. A non-empty group is only removed with `cascade`,
    /// taking its contacts with it.
    pub fn delete_group(&self, name: &str, cascade: bool) -> PhonebookResult<Group> {
        let removed = self.mutate("delete_group", |phonebook| {
            let group = phonebook.group(name).ok_or_else(|| group_not_found(name))?;
            if !cascade && !group.is_empty() {
                return Err(PhonebookError::Conflict(ConflictReason::GroupNotEmpty {
                    group: name.to_string(),
                    contacts: group.len(),
                }));
            }
            phonebook
                .remove_group(name)
                .ok_or_else(|| group_not_found(name))
        })?;

        info!(
            "Deleted group '{}' with {} contact(s)",
            removed.name,
            removed.len()
        );
        Ok(removed)
    }

    /// Put the named groups first, in the given order. Unknown names are
    /// ignored and unmentioned groups keep their relative order after them.
    pub fn reorder_groups(&self, order: &[String]) -> PhonebookResult<Vec<GroupSummary>> {
        let summaries = self.mutate("reorder_groups", |phonebook| {
            phonebook.reorder_groups(order);
            Ok(phonebook.summaries())
        })?;
        info!("Reordered {} group(s)", summaries.len());
        Ok(summaries)
    }

    /// Replace the whole phonebook with the contents of a spreadsheet.
    ///
    /// Rows without any number are dropped and counted. Any other invalid
    /// row, or a result with too many groups, aborts the import and leaves
    /// the stored phonebook untouched.
    pub fn import_spreadsheet(&self, bytes: &[u8]) -> PhonebookResult<ImportReport> {
        let sheet = spreadsheet::decode(bytes).inspect_err(|err| {
            warn!("Spreadsheet import rejected: {}", err);
        })?;
        let row_count = sheet.rows.len() + sheet.skipped;

        let (phonebook, invalid_rows) = self.phonebook_from_rows(sheet.rows)?;
        let dropped_count = sheet.skipped + invalid_rows;
        validate_phonebook(&phonebook).inspect_err(|err| {
            warn!("Spreadsheet import rejected: {}", err);
        })?;

        let path = self.phonebook_path()?;
        {
            let _lock = PathLock::acquire(&path, self.options.lock_timeout)?;
            self.persist(&path, &phonebook)?;
        }

        let report = ImportReport {
            accepted_count: phonebook.contact_count(),
            dropped_count,
            group_count: phonebook.group_count(),
        };
        info!(
            "Imported {} of {} row(s) into {} group(s), dropped {}",
            report.accepted_count, row_count, report.group_count, report.dropped_count
        );
        Ok(report)
    }

    fn phonebook_from_rows(&self, rows: Vec<ContactRow>) -> PhonebookResult<(Phonebook, usize)> {
        let mut phonebook = Phonebook::new();
        let mut dropped = 0;

        for row in rows {
            let contact = row.to_contact();
            match validate_contact(&contact) {
                Ok(()) => {}
                Err(ValidationError::NoIdentifyingData) => {
                    debug!("Dropping row '{}' without any number", row.name);
                    dropped += 1;
                    continue;
                }
                Err(err) => {
                    warn!("Spreadsheet import rejected at row '{}': {}", row.name, err);
                    return Err(err.into());
                }
            }

            let group = if row.department.is_empty() {
                match &self.options.ungrouped_policy {
                    UngroupedPolicy::Bucket(name) => name.clone(),
                    UngroupedPolicy::Reject => {
                        warn!(
                            "Spreadsheet import rejected at row '{}': no department",
                            row.name
                        );
                        return Err(ValidationError::MissingGroup.into());
                    }
                }
            } else {
                row.department
            };

            if !phonebook.contains_group(&group) {
                validate_new_group_name(&phonebook, &group).inspect_err(|err| {
                    warn!("Spreadsheet import rejected at group '{}': {}", group, err);
                })?;
            }
            phonebook.group_entry(&group).push(contact);
        }

        Ok((phonebook, dropped))
    }

    /// The current phonebook as `.xlsx` bytes, one row per contact.
    pub fn export_spreadsheet(&self) -> PhonebookResult<Vec<u8>> {
        let phonebook = self.load()?;
        let bytes = spreadsheet::encode(&spreadsheet::rows_from_phonebook(&phonebook))?;
        info!(
            "Exported {} contact(s) in {} group(s)",
            phonebook.contact_count(),
            phonebook.group_count()
        );
        Ok(bytes)
    }

    /// The phonebook file exactly as stored, or the empty skeleton when it
    /// does not exist yet.
    pub fn raw_file_bytes(&self) -> PhonebookResult<Vec<u8>> {
        let path = self.phonebook_path()?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Ok(markup::encode(&Phonebook::new()))
            }
            Err(source) => Err(PhonebookError::io(&path, source)),
        }
    }

    pub fn storage_directory(&self) -> PhonebookResult<PathBuf> {
        self.location.current_directory()
    }

    /// Point the repository at another directory. Later operations use the
    /// phonebook file there.
    pub fn set_storage_directory(&self, path: &Path) -> PhonebookResult<()> {
        self.location.set_directory(path)
    }
}
