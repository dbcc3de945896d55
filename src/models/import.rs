//! Outcome of a spreadsheet import.

use serde::Serialize;

/// Counts reported after a successful full-replace import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Contacts written to the new phonebook
    pub accepted_count: usize,

    /// Non-empty rows dropped for having no number, whether they carried a
    /// name or only a department or photo. Entirely empty rows are not
    /// counted.
    pub dropped_count: usize,

    /// Groups in the new phonebook
    pub group_count: usize,
}
