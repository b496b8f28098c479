use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use super::types::*;
use crate::error::CompileError;

/// Read one sheet of a workbook into a [`Grid`]
pub fn read_grid(source: &Source, options: &ReadOptions) -> Result<Grid, CompileError> {
    match source {
        Source::Path(path) => {
            ensure_exists(path)?;
            let mut workbook = open_workbook_auto(path).map_err(|e| {
                CompileError::malformed(format!("Failed to open workbook: {}", e))
            })?;
            read_sheet(&mut workbook, options)
        }
        Source::Bytes(bytes) => read_grid_from_bytes(bytes, options),
    }
}

/// Read one sheet of an in-memory workbook into a [`Grid`]
pub fn read_grid_from_bytes(bytes: &[u8], options: &ReadOptions) -> Result<Grid, CompileError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| CompileError::malformed(format!("Failed to open workbook: {}", e)))?;
    read_sheet(&mut workbook, options)
}

/// Raw bytes of the source; files are read once, in full.
pub fn read_source_bytes(source: &Source) -> Result<Cow<'_, [u8]>, CompileError> {
    match source {
        Source::Bytes(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
        Source::Path(path) => {
            ensure_exists(path)?;
            Ok(Cow::Owned(std::fs::read(path)?))
        }
    }
}

fn ensure_exists(path: &Path) -> Result<(), CompileError> {
    if !path.exists() {
        return Err(CompileError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }
    Ok(())
}

fn read_sheet<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    options: &ReadOptions,
) -> Result<Grid, CompileError> {
    let sheet_names = workbook.sheet_names().to_vec();

    // Determine which sheet to read
    let target_sheet = match &options.sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(CompileError::malformed(format!("Sheet not found: {}", name)));
            }
            name.clone()
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| CompileError::malformed("Workbook has no sheets"))?,
    };

    let range = workbook.worksheet_range(&target_sheet).map_err(|e| {
        CompileError::malformed(format!("Failed to read sheet '{}': {}", target_sheet, e))
    })?;

    let grid = range_to_grid(&range);
    tracing::debug!(
        sheet = %target_sheet,
        rows = grid.row_count(),
        cols = grid.col_count(),
        "read sheet"
    );
    Ok(grid)
}

/// Convert a used range into a grid anchored at A1.
///
/// calamine ranges start at the first used cell, so leading blank rows and
/// columns are padded back in to keep positional addressing stable.
fn range_to_grid(range: &Range<Data>) -> Grid {
    let (row_count, col_count) = range.get_size();
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row];

    for row_idx in 0..row_count {
        let mut row_data = vec![String::new(); start_col];

        for col_idx in 0..col_count {
            let cell = range.get((row_idx, col_idx));
            row_data.push(convert_cell_value(cell).into_text());
        }

        rows.push(row_data);
    }

    Grid::from_rows(rows)
}

/// Convert calamine Data to our CellValue
fn convert_cell_value(cell: Option<&Data>) -> CellValue {
    match cell {
        None => CellValue::Empty,
        Some(data) => match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::DateTime(dt) => CellValue::DateTime(format_excel_datetime(dt.as_f64())),
            Data::DateTimeIso(s) => CellValue::DateTime(s.clone()),
            Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        },
    }
}

/// Format Excel datetime (days since 1899-12-30) to ISO 8601
fn format_excel_datetime(value: f64) -> String {
    let days = value.floor() as i64;
    let time_fraction = value.fract();

    let date = match chrono::NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|epoch| {
        chrono::TimeDelta::try_days(days).and_then(|delta| epoch.checked_add_signed(delta))
    }) {
        Some(date) => date,
        None => return value.to_string(),
    };

    let total_seconds = (time_fraction * 86400.0).round() as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let time = chrono::NaiveTime::from_hms_opt(hours, minutes, seconds).unwrap_or_default();
    let datetime = chrono::NaiveDateTime::new(date, time);

    datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Convert column index (0-based) to Excel column letter (A, B, ..., Z, AA, AB, ...)
pub fn column_index_to_letter(index: u32) -> String {
    let mut result = String::new();
    let mut n = index + 1;

    while n > 0 {
        n -= 1;
        let c = (b'A' + (n % 26) as u8) as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Get list of sheets in a workbook, with their used sizes
pub fn get_sheets(source: &Source) -> Result<Vec<SheetInfo>, CompileError> {
    match source {
        Source::Path(path) => {
            let mut workbook = open_workbook_auto(path).map_err(|e| {
                CompileError::malformed(format!("Failed to open workbook: {}", e))
            })?;
            Ok(sheet_infos(&mut workbook))
        }
        Source::Bytes(bytes) => {
            let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.as_slice()))
                .map_err(|e| CompileError::malformed(format!("Failed to open workbook: {}", e)))?;
            Ok(sheet_infos(&mut workbook))
        }
    }
}

fn sheet_infos<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Vec<SheetInfo> {
    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::new();

    for (index, name) in sheet_names.iter().enumerate() {
        let (rows, cols) = workbook
            .worksheet_range(name)
            .map(|range| range.get_size())
            .unwrap_or((0, 0));
        sheets.push(SheetInfo {
            name: name.clone(),
            index: index as u32,
            row_count: rows as u32,
            col_count: cols as u32,
        });
    }

    sheets
}

/// Compute SHA-256 checksum of the source bytes
pub fn compute_checksum(source: &Source) -> Result<String, CompileError> {
    match source {
        Source::Bytes(bytes) => Ok(checksum_bytes(bytes)),
        Source::Path(path) => {
            let mut hasher = Sha256::new();
            hash_file(path, &mut hasher)?;
            Ok(format!("{:x}", hasher.finalize()))
        }
    }
}

/// SHA-256 of an in-memory buffer, as lowercase hex
pub fn checksum_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn hash_file(path: &Path, hasher: &mut Sha256) -> Result<(), CompileError> {
    let mut file = File::open(path)?;
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index_to_letter() {
        assert_eq!(column_index_to_letter(0), "A");
        assert_eq!(column_index_to_letter(1), "B");
        assert_eq!(column_index_to_letter(25), "Z");
        assert_eq!(column_index_to_letter(26), "AA");
        assert_eq!(column_index_to_letter(27), "AB");
        assert_eq!(column_index_to_letter(51), "AZ");
        assert_eq!(column_index_to_letter(52), "BA");
    }

    #[test]
    fn test_format_excel_datetime() {
        assert_eq!(format_excel_datetime(45292.5), "2024-01-01T12:00:00");
    }

    #[test]
    fn test_out_of_range_datetime_falls_back_to_number() {
        assert_eq!(format_excel_datetime(1e20), 1e20_f64.to_string());
        assert_eq!(format_excel_datetime(-1e20), (-1e20_f64).to_string());
    }

    #[test]
    fn test_read_source_bytes() {
        let source = Source::Bytes(b"abc".to_vec());
        let borrowed = read_source_bytes(&source).unwrap();
        assert!(matches!(borrowed, Cow::Borrowed(_)));
        assert_eq!(&*borrowed, b"abc");

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("input.bin");
        std::fs::write(&path, b"abc").unwrap();
        let source = Source::Path(path.clone());
        let bytes = read_source_bytes(&source).unwrap();
        assert_eq!(checksum_bytes(&bytes), compute_checksum(&Source::Path(path)).unwrap());

        let err = read_source_bytes(&Source::Path(dir.path().join("absent.xlsx"))).unwrap_err();
        assert!(matches!(err, CompileError::Io(e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_garbage_bytes_are_malformed() {
        let source = Source::Bytes(b"not a spreadsheet".to_vec());
        let err = read_grid(&source, &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::MalformedInput(_)));
    }

    #[test]
    fn test_checksum_of_bytes() {
        let checksum = compute_checksum(&Source::Bytes(b"abc".to_vec())).unwrap();
        assert_eq!(
            checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
