//! Spreadsheet import/export.
//!
//! Reads the first worksheet of a legacy `.xls` or modern `.xlsx` workbook
//! and writes `.xlsx`. Six columns are recognised by header text, in any
//! order and any letter case; other columns are ignored.

use calamine::{Data, Range, Reader, Xls, Xlsx};
use rust_xlsxwriter::Workbook;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use crate::error::{PhonebookError, PhonebookResult};
use crate::models::{Contact, Phonebook};

/// Canonical column headers, in export order.
pub const COLUMNS: [&str; 6] = [
    "Department",
    "Name",
    "Office Number",
    "Mobile Number",
    "Other Number",
    "Head Portrait",
];

const WORKSHEET_NAME: &str = "Phonebook";

/// One spreadsheet line, fields already trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactRow {
    pub department: String,
    pub name: String,
    pub office_number: String,
    pub mobile_number: String,
    pub other_number: String,
    pub photo_ref: String,
}

impl ContactRow {
    pub fn from_contact(department: &str, contact: &Contact) -> Self {
        Self {
            department: department.to_string(),
            name: contact.name.clone(),
            office_number: contact.office_number.clone(),
            mobile_number: contact.mobile_number.clone(),
            other_number: contact.other_number.clone(),
            photo_ref: contact.photo_ref.clone(),
        }
    }

    /// The contact part of the row; the department is the caller's concern.
    pub fn to_contact(&self) -> Contact {
        Contact {
            name: self.name.clone(),
            office_number: self.office_number.clone(),
            mobile_number: self.mobile_number.clone(),
            other_number: self.other_number.clone(),
            photo_ref: self.photo_ref.clone(),
        }
    }

    /// Fields in [`COLUMNS`] order.
    fn fields(&self) -> [&str; 6] {
        [
            &self.department,
            &self.name,
            &self.office_number,
            &self.mobile_number,
            &self.other_number,
            &self.photo_ref,
        ]
    }

    /// No name and no number: nothing worth importing.
    fn is_blank(&self) -> bool {
        self.name.is_empty()
            && self.office_number.is_empty()
            && self.mobile_number.is_empty()
            && self.other_number.is_empty()
    }

    fn is_empty(&self) -> bool {
        self.fields().iter().all(|field| field.is_empty())
    }
}

/// Data rows read from the first worksheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRows {
    /// Rows with a name or at least one number, in sheet order
    pub rows: Vec<ContactRow>,
    /// Rows with some content but neither a name nor a number
    pub skipped: usize,
}

/// Container format, detected from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    /// Legacy BIFF inside an OLE compound file
    Xls,
    /// Office Open XML inside a zip archive
    Xlsx,
}

const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

pub fn detect_kind(bytes: &[u8]) -> Option<SpreadsheetKind> {
    if bytes.starts_with(&OLE_MAGIC) {
        Some(SpreadsheetKind::Xls)
    } else if bytes.starts_with(&ZIP_MAGIC) {
        Some(SpreadsheetKind::Xlsx)
    } else {
        None
    }
}

fn first_sheet<RS, R>(mut workbook: R) -> PhonebookResult<Range<Data>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => Ok(range),
        Some(Err(e)) => Err(PhonebookError::Format(format!(
            "cannot read first worksheet: {}",
            e
        ))),
        None => Err(PhonebookError::Format(
            "workbook has no worksheets".to_string(),
        )),
    }
}

fn open_failed(e: impl std::fmt::Display) -> PhonebookError {
    PhonebookError::Format(format!("cannot open spreadsheet: {}", e))
}

/// Render a cell the way a person typed it. Integral floats lose their
/// `.0`, since phone numbers are routinely stored as numbers.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

/// Column index of each canonical header within the sheet.
struct ColumnMap([usize; 6]);

impl ColumnMap {
    fn from_header(header: &[Data]) -> PhonebookResult<Self> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            positions
                .entry(cell_text(cell).to_lowercase())
                .or_insert(idx);
        }

        let mut columns = [0usize; 6];
        let mut missing = Vec::new();
        for (slot, title) in columns.iter_mut().zip(COLUMNS) {
            match positions.get(&title.to_lowercase()) {
                Some(idx) => *slot = *idx,
                None => missing.push(title),
            }
        }
        if !missing.is_empty() {
            return Err(PhonebookError::Format(format!(
                "missing column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(Self(columns))
    }

    fn row(&self, cells: &[Data]) -> ContactRow {
        let get = |column: usize| cells.get(self.0[column]).map(cell_text).unwrap_or_default();
        ContactRow {
            department: get(0),
            name: get(1),
            office_number: get(2),
            mobile_number: get(3),
            other_number: get(4),
            photo_ref: get(5),
        }
    }
}

fn decode_range(range: &Range<Data>) -> PhonebookResult<SheetRows> {
    let mut cells = range.rows();
    let header = cells
        .next()
        .ok_or_else(|| PhonebookError::Format("missing header row".to_string()))?;
    let columns = ColumnMap::from_header(header)?;

    let mut sheet = SheetRows::default();
    for row in cells.map(|cells| columns.row(cells)) {
        if !row.is_blank() {
            sheet.rows.push(row);
        } else if !row.is_empty() {
            sheet.skipped += 1;
        }
    }
    Ok(sheet)
}

/// Parse a workbook into contact rows.
///
/// Rows with neither a name nor a number are skipped; entirely empty rows
/// are not even counted. Rows with a blank department are kept; deciding
/// what to do with them is up to the caller.
pub fn decode(bytes: &[u8]) -> PhonebookResult<SheetRows> {
    let kind = detect_kind(bytes).ok_or_else(|| {
        PhonebookError::Format("not an .xls or .xlsx spreadsheet".to_string())
    })?;

    let range = match kind {
        SpreadsheetKind::Xls => {
            let workbook: Xls<_> = Xls::new(Cursor::new(bytes)).map_err(open_failed)?;
            first_sheet(workbook)?
        }
        SpreadsheetKind::Xlsx => {
            let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(open_failed)?;
            first_sheet(workbook)?
        }
    };
    decode_range(&range)
}

/// Flatten a phonebook into rows: group order, then contact order.
pub fn rows_from_phonebook(phonebook: &Phonebook) -> Vec<ContactRow> {
    phonebook
        .groups()
        .iter()
        .flat_map(|group| {
            group
                .contacts
                .iter()
                .map(move |contact| ContactRow::from_contact(&group.name, contact))
        })
        .collect()
}

fn encode_failed(e: impl std::fmt::Display) -> PhonebookError {
    PhonebookError::Encode(e.to_string())
}

/// Write rows to an `.xlsx` workbook with the canonical header row.
///
/// Every value is written as text so that numbers keep leading zeros and
/// `+` signs.
pub fn encode(rows: &[ContactRow]) -> PhonebookResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(WORKSHEET_NAME).map_err(encode_failed)?;

    for (col, title) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *title)
            .map_err(encode_failed)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let row_num = u32::try_from(idx + 1)
            .map_err(|_| PhonebookError::Encode("too many rows".to_string()))?;
        for (col, value) in row.fields().iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(row_num, col as u16, *value)
                .map_err(encode_failed)?;
        }
    }

    workbook.save_to_buffer().map_err(encode_failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Group;

    /// Build an `.xlsx` with arbitrary header and string cells.
    fn workbook(header: &[&str], rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, title) in header.iter().enumerate() {
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

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind(&OLE_MAGIC), Some(SpreadsheetKind::Xls));
        assert_eq!(
            detect_kind(&workbook(&COLUMNS, &[])),
            Some(SpreadsheetKind::Xlsx)
        );
        assert_eq!(detect_kind(b"Department,Name\n"), None);
    }

    #[test]
    fn test_headers_match_case_and_order_insensitively() {
        let bytes = workbook(
            &[
                "name",
                "HEAD PORTRAIT",
                "Notes",
                " Department ",
                "other number",
                "Mobile Number",
                "office NUMBER",
            ],
            &[&["Alice", "", "ignored", "Sales", "", "555", "100"]],
        );
        let rows = decode(&bytes).unwrap().rows;
        assert_eq!(
            rows,
            vec![ContactRow {
                department: "Sales".into(),
                name: "Alice".into(),
                office_number: "100".into(),
                mobile_number: "555".into(),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let bytes = workbook(&COLUMNS[..5], &[&["Sales", "Alice", "100", "", ""]]);
        match decode(&bytes) {
            Err(PhonebookError::Format(msg)) => assert!(msg.contains("Head Portrait")),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_rows_are_dropped_but_groupless_rows_kept() {
        let bytes = workbook(
            &COLUMNS,
            &[
                &["Sales", "Bob", "", "555", "", ""],
                &["Sales", "", "", "", "", "photo.png"],
                &["", "Orphan", "7", "", "", ""],
                &["", "", "", "", "9", ""],
                &["  ", "  ", " ", "", "", ""],
            ],
        );
        let sheet = decode(&bytes).unwrap();
        let names: Vec<&str> = sheet.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Orphan", ""]);
        assert_eq!(sheet.rows[1].department, "");
        assert_eq!(sheet.rows[2].other_number, "9");
        // The photo-only row counts, the whitespace-only row does not
        assert_eq!(sheet.skipped, 1);
    }

    #[test]
    fn test_numeric_cells_render_without_fraction() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, title) in COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *title).unwrap();
        }
        sheet.write_string(1, 0, "Sales").unwrap();
        sheet.write_string(1, 1, "Alice").unwrap();
        sheet.write_number(1, 2, 100.0).unwrap();
        sheet.write_number(1, 3, 79001234567.0).unwrap();
        sheet.write_number(1, 4, 12.5).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let rows = decode(&bytes).unwrap().rows;
        assert_eq!(rows[0].office_number, "100");
        assert_eq!(rows[0].mobile_number, "79001234567");
        assert_eq!(rows[0].other_number, "12.5");
    }

    #[test]
    fn test_decode_legacy_xls() {
        // BIFF8 workbook: mixed-case headers, phone numbers stored as numbers
        let bytes = include_bytes!("../../tests/fixtures/phonebook.xls");
        assert_eq!(detect_kind(bytes), Some(SpreadsheetKind::Xls));

        let sheet = decode(bytes).unwrap();
        assert_eq!(sheet.skipped, 0);
        assert_eq!(
            sheet.rows,
            vec![
                ContactRow {
                    department: "Sales".into(),
                    name: "Alice".into(),
                    office_number: "100".into(),
                    ..Default::default()
                },
                ContactRow {
                    department: "Support".into(),
                    name: "Bob".into(),
                    mobile_number: "+7 900 111".into(),
                    other_number: "42".into(),
                    photo_ref: "Config:bob.png".into(),
                    ..Default::default()
                },
                ContactRow {
                    name: "Carol".into(),
                    mobile_number: "5551234".into(),
                    ..Default::default()
                },
                ContactRow {
                    department: "Sales".into(),
                    name: "Name Only".into(),
                    ..Default::default()
                },
            ]
        );
    }

    #[test]
    fn test_garbage_is_format_error() {
        for bytes in [
            &b""[..],
            &b"hello world"[..],
            &ZIP_MAGIC[..],
            &OLE_MAGIC[..],
        ] {
            assert!(matches!(decode(bytes), Err(PhonebookError::Format(_))));
        }
    }

    #[test]
    fn test_encode_then_decode_preserves_rows() {
        let phonebook = Phonebook::from_groups(vec![
            Group::with_contacts(
                "Sales",
                vec![
                    Contact::new("Alice").with_office("0100"),
                    Contact::new("Carol").with_mobile("+7 900").with_photo_ref("c.png"),
                ],
            ),
            Group::with_contacts("Support", vec![Contact::new("Bob").with_other("555")]),
        ]);
        let rows = rows_from_phonebook(&phonebook);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].department, "Support");

        let decoded = decode(&encode(&rows).unwrap()).unwrap();
        assert_eq!(decoded.rows, rows);
        assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn test_encode_empty_has_header_only() {
        let bytes = encode(&[]).unwrap();
        assert_eq!(decode(&bytes).unwrap(), SheetRows::default());
    }
}
