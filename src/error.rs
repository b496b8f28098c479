use std::fmt;
use std::io;

use thiserror::Error;

/// Where in the source sheet a record came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// 1-based row number, as shown by spreadsheet applications.
    pub row: usize,
    /// Column letter (`A`, `B`, ..., `AA`) when the problem is tied to one cell.
    pub column: Option<String>,
}

impl Location {
    pub fn row(row_index: usize) -> Self {
        Location {
            row: row_index + 1,
            column: None,
        }
    }

    pub fn cell(row_index: usize, col_index: usize) -> Self {
        Location {
            row: row_index + 1,
            column: Some(crate::excel::column_index_to_letter(col_index as u32)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(col) => write!(f, "{}{}", col, self.row),
            None => write!(f, "row {}", self.row),
        }
    }
}

/// Errors produced by a compilation run.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("no records found: {0}")]
    NoRecordsFound(String),
    #[error("assembly error at {location}: {message}")]
    Assembly { location: Location, message: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CompileError {
    pub fn malformed(message: impl Into<String>) -> Self {
        CompileError::MalformedInput(message.into())
    }

    pub fn no_records(message: impl Into<String>) -> Self {
        CompileError::NoRecordsFound(message.into())
    }

    pub fn assembly(location: Location, message: impl Into<String>) -> Self {
        CompileError::Assembly {
            location,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(err: serde_json::Error) -> Self {
        CompileError::Io(io::Error::from(err))
    }
}
