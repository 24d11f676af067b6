//! Spreadsheet uploads: the first worksheet is flattened to CSV text.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};

use crate::error::StoreError;

/// Extensions handled by [`worksheet_to_csv`].
pub const SPREADSHEET_EXTENSIONS: [&str; 4] = [".xlsx", ".xlsm", ".xlsb", ".xls"];

pub fn is_spreadsheet(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    SPREADSHEET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Convert the first worksheet of a workbook to CSV bytes.
///
/// The first row is the header; blank header cells become `column_<n>`.
pub fn worksheet_to_csv(bytes: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| StoreError::UploadRejected(format!("Excel: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| StoreError::UploadRejected("Excel file has no worksheets".to_string()))?
        .map_err(|e| StoreError::UploadRejected(format!("Excel: {e}")))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| StoreError::UploadRejected("worksheet is empty".to_string()))?;

    let mut out = String::new();
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let name = cell_text(cell);
            if name.trim().is_empty() {
                format!("column_{}", idx + 1)
            } else {
                name
            }
        })
        .collect();
    push_record(&mut out, names.iter().map(String::as_str));

    for row in rows {
        let cells: Vec<String> = (0..names.len())
            .map(|idx| row.get(idx).map(cell_text).unwrap_or_default())
            .collect();
        push_record(&mut out, cells.iter().map(String::as_str));
    }

    Ok(out.into_bytes())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (idx, field) in fields.enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&quote_field(field));
    }
    out.push('\n');
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
