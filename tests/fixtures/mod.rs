//! Shared setup for repository integration tests.
//!
//! Every test gets its own temporary storage directory, so tests can run in
//! parallel without touching each other's phonebook files.

#![allow(dead_code)]

use remote_phonebook::codec::spreadsheet::COLUMNS;
use remote_phonebook::{
    Contact, FilePhonebookRepository, LocalDirectory, RepositoryOptions, StorageLocation,
};
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const FILE_NAME: &str = "rem.xml";

/// A repository over a fresh temporary directory.
///
/// The directory lives as long as this value.
pub struct TestPhonebook {
    pub dir: TempDir,
    pub location: Arc<LocalDirectory>,
    pub repo: FilePhonebookRepository,
}

impl TestPhonebook {
    pub fn new() -> Self {
        Self::with_options(RepositoryOptions::default())
    }

    pub fn with_options(options: RepositoryOptions) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let location =
            Arc::new(LocalDirectory::new(dir.path(), FILE_NAME).expect("prepare directory"));
        let repo = FilePhonebookRepository::new(
            location.clone() as Arc<dyn StorageLocation>,
            RepositoryOptions {
                file_name: FILE_NAME.to_string(),
                ..options
            },
        );
        Self {
            dir,
            location,
            repo,
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.path().join(FILE_NAME)
    }

    pub fn file_bytes(&self) -> Vec<u8> {
        fs::read(self.file_path()).expect("read phonebook file")
    }

    pub fn write_file(&self, contents: &str) {
        fs::write(self.file_path(), contents).expect("write phonebook file");
    }

    /// Add `name` with an office number to `group`.
    pub fn add(&self, group: &str, name: &str, office: &str) {
        self.repo
            .add_or_edit_contact(group, Contact::new(name).with_office(office), None)
            .expect("add contact");
    }

    pub fn group_names(&self) -> Vec<String> {
        self.repo
            .list_groups()
            .expect("list groups")
            .into_iter()
            .map(|summary| summary.name)
            .collect()
    }
}

/// Build an `.xlsx` with the canonical header and the given rows
/// (Department, Name, Office, Mobile, Other, Head Portrait).
pub fn spreadsheet(rows: &[[&str; 6]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, title) in COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *title).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32 + 1, col as u16, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}
