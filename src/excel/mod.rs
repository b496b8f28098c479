//! Excel module for reading workbooks into text grids and writing simple ones.
//!
//! This module provides:
//! - Reading a sheet into an A1-anchored [`Grid`] with blanks normalized to `""`
//! - Header-row schema checks
//! - Writing rows to a new workbook (templates and fixtures)

pub mod types;
pub mod reader;
pub mod schema;
pub mod writer;

// Re-export commonly used types and functions
pub use types::*;
pub use reader::{
    checksum_bytes, column_index_to_letter, compute_checksum, get_sheets, read_grid,
    read_grid_from_bytes, read_source_bytes,
};
pub use schema::{validate_headers, HeaderCheck, HeaderSchema};
pub use writer::export_to_new_file;
