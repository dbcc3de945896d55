//! Conversions between the phonebook model and its two file formats.
//!
//! - **markup**: the Yealink XML file the phones download
//! - **spreadsheet**: `.xls`/`.xlsx` workbooks for bulk editing
//!
//! The two codecs are independent of each other and of storage.

pub mod markup;
pub mod spreadsheet;

pub use spreadsheet::{ContactRow, SheetRows, SpreadsheetKind};
