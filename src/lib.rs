//! Remote Phonebook - a Yealink remote phonebook repository with an MCP front end.
//!
//! This library keeps a single Yealink XML phonebook file consistent under
//! concurrent edits, and converts it to and from spreadsheets for bulk editing.
//!
//! # Architecture
//!
//! - **models**: Contacts, groups, and the in-memory phonebook
//! - **domain**: Phone limits and validation rules
//! - **codec**: Yealink XML and spreadsheet formats
//! - **storage**: Storage directory, atomic replacement, and writer locking
//! - **repositories**: Load-mutate-validate-persist operations, sync and async
//! - **error**: Custom error types for precise error handling
//! - **config**: Configuration management from environment variables
//! - **server**: MCP protocol server

pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod repositories;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, UngroupedPolicy};
pub use domain::ValidationError;
pub use error::{ConfigError, ConflictReason, PhonebookError, PhonebookResult};
pub use models::{Contact, ContactEntry, Group, GroupSummary, ImportReport, Phonebook};
pub use repositories::{
    AsyncFilePhonebookRepository, FilePhonebookRepository, PhonebookRepository,
    RepositoryOptions,
};
pub use server::PhonebookMcpServer;
pub use storage::{LocalDirectory, StorageLocation};
