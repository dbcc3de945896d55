//! Data models for the phonebook.
//!
//! This module contains the in-memory representation of a phonebook file:
//! contacts, groups and the phonebook aggregate, plus the small result
//! types returned by repository operations.

pub mod contact;
pub mod import;
pub mod phonebook;

pub use contact::{Contact, ContactEntry};
pub use import::ImportReport;
pub use phonebook::{Group, GroupSummary, Phonebook};
