use std::path::Path;
use umya_spreadsheet::{new_file, writer};

use super::reader::compute_checksum;
use super::types::Source;
use crate::error::CompileError;

/// Write rows of text cells to a new workbook, returning its checksum.
///
/// Blank strings leave the cell unset so the written sheet reads back with
/// the same blank positions.
pub fn export_to_new_file(
    rows: &[Vec<String>],
    output_path: &Path,
    sheet_name: Option<&str>,
) -> Result<String, CompileError> {
    let mut book = new_file();

    let sheet_name = sheet_name.unwrap_or("Sheet1");

    // new_file() ships with "Sheet1"; rename it rather than adding a second sheet
    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| write_error("New workbook has no default sheet".to_string()))?;
    sheet.set_name(sheet_name);

    for (row_idx, row) in rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;

        for (col_idx, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let col_num = (col_idx + 1) as u32;
            sheet.get_cell_mut((col_num, row_num)).set_value(value);
        }
    }

    writer::xlsx::write(&book, output_path)
        .map_err(|e| write_error(format!("Failed to write file: {}", e)))?;

    compute_checksum(&Source::Path(output_path.to_path_buf()))
}

fn write_error(message: String) -> CompileError {
    CompileError::Io(std::io::Error::other(message))
}
