use std::path::PathBuf;

/// Information about a sheet in a workbook
#[derive(Debug, Clone)]
pub struct SheetInfo {
    pub name: String,
    pub index: u32,
    pub row_count: u32,
    pub col_count: u32,
}

/// Represents a cell value with type information, as read from the workbook
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    String(String),
    Number(f64),
    Boolean(bool),
    DateTime(String), // ISO 8601 format
    Error(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    /// Render the cell as the plain text the compiler works with.
    ///
    /// Blanks and error cells become the empty string; integral numbers drop
    /// their fractional part so an id typed as `7` does not turn into `7.0`.
    pub fn into_text(self) -> String {
        match self {
            CellValue::Empty | CellValue::Error(_) => String::new(),
            CellValue::String(s) => s,
            CellValue::Number(n) => format_number(n),
            CellValue::Boolean(b) => if b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(dt) => dt,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Where the workbook bytes come from
#[derive(Debug, Clone)]
pub enum Source {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl Source {
    pub fn describe(&self) -> String {
        match self {
            Source::Path(p) => p.display().to_string(),
            Source::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

/// Options for reading a workbook
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Sheet name; the first sheet is used when unset.
    pub sheet: Option<String>,
}

/// A rectangular sheet of text cells, addressed from A1.
///
/// Missing cells are normalized to `""` when the grid is built, so accessors
/// never hand out a "no value" marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl Grid {
    /// Build a grid from ragged rows; short rows are padded with blanks.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<C>>,
        C: Into<String>,
    {
        let mut rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Grid { rows, width }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text at (row, col); out-of-range positions read as blank.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Trimmed cell text at (row, col).
    pub fn trimmed(&self, row: usize, col: usize) -> &str {
        self.cell(row, col).trim()
    }

    pub fn row(&self, row: usize) -> &[String] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when every cell in the row is blank after trimming.
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.row(row).iter().all(|c| c.trim().is_empty())
    }

    /// Treat `header_row` as column names and address the rows below it by name.
    pub fn with_header(&self, header_row: usize) -> HeaderedGrid<'_> {
        let headers = self
            .row(header_row)
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        HeaderedGrid {
            grid: self,
            header_row,
            headers,
        }
    }
}

/// A grid whose columns can be looked up by header name.
#[derive(Debug, Clone)]
pub struct HeaderedGrid<'a> {
    grid: &'a Grid,
    header_row: usize,
    headers: Vec<String>,
}

impl<'a> HeaderedGrid<'a> {
    pub fn header_row(&self) -> usize {
        self.header_row
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Column index for a header, matched case-insensitively.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name.trim()))
    }

    /// Indices of the data rows below the header.
    pub fn data_rows(&self) -> std::ops::Range<usize> {
        (self.header_row + 1)..self.grid.row_count().max(self.header_row + 1)
    }

    pub fn row(&self, row: usize) -> RowView<'_, 'a> {
        RowView { table: self, row }
    }
}

/// One data row of a [`HeaderedGrid`].
#[derive(Debug, Clone, Copy)]
pub struct RowView<'t, 'a> {
    table: &'t HeaderedGrid<'a>,
    row: usize,
}

impl<'t, 'a> RowView<'t, 'a> {
    pub fn index(&self) -> usize {
        self.row
    }

    /// Trimmed text of the named column; unknown columns read as blank.
    pub fn get(&self, column: &str) -> &'a str {
        match self.table.column(column) {
            Some(col) => self.table.grid.trimmed(self.row, col),
            None => "",
        }
    }

    pub fn is_blank(&self) -> bool {
        self.table.grid.is_blank_row(self.row)
    }
}
