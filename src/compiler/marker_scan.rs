//! Extraction for sheets made of repeated sentinel blocks.
//!
//! A "Project ID" row introduces one or more project rows; a "Part ID" row
//! introduces the parts of the project block with the same sequence number.
//! A block runs until the first row whose first cell is blank.

use super::types::{Dialect, Extraction, RawPart, RawTask};
use super::Extractor;
use crate::config::MarkerScanConfig;
use crate::error::CompileError;
use crate::excel::Grid;

// Project block columns
const PROJECT_ID: usize = 0;
const PROJECT_TITLE: usize = 1;
const PROJECT_DESCRIPTION: usize = 2;
const PROJECT_DATASET: usize = 3;
const PROJECT_SOLUTION_FILE: usize = 7;

// Part block columns
const PART_ID: usize = 0;
const PART_DESCRIPTION: usize = 2;
const PART_EXPECTED: usize = 3;
const PART_VALIDATION: usize = 4;
const PART_THRESHOLD: usize = 5;

/// A data row found under a sentinel, with the sentinel's sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRow {
    pub sequence: usize,
    pub row: usize,
}

/// Find every row under every occurrence of `sentinel`.
///
/// Sequence numbers start at 1 and advance once per sentinel occurrence,
/// including sentinels followed directly by a blank row.
pub fn scan_blocks(grid: &Grid, sentinel: &str) -> Vec<BlockRow> {
    let sentinel = sentinel.trim();
    let mut rows = Vec::new();
    let mut sequence = 0;

    for i in 0..grid.row_count() {
        if grid.trimmed(i, 0) != sentinel {
            continue;
        }
        sequence += 1;

        let mut j = i + 1;
        while j < grid.row_count() && !grid.trimmed(j, 0).is_empty() {
            rows.push(BlockRow { sequence, row: j });
            j += 1;
        }
        tracing::debug!(sentinel, sequence, rows = j - i - 1, "scanned block");
    }

    rows
}

pub struct MarkerScanExtractor<'a> {
    config: &'a MarkerScanConfig,
}

impl<'a> MarkerScanExtractor<'a> {
    pub fn new(config: &'a MarkerScanConfig) -> Self {
        Self { config }
    }
}

impl Extractor for MarkerScanExtractor<'_> {
    fn dialect(&self) -> Dialect {
        Dialect::MarkerScan
    }

    fn extract(&self, grid: &Grid) -> Result<Extraction, CompileError> {
        let project_rows = scan_blocks(grid, &self.config.project_sentinel);
        if project_rows.is_empty() {
            return Err(CompileError::no_records(format!(
                "no questions found under '{}' headers",
                self.config.project_sentinel
            )));
        }

        let part_rows = scan_blocks(grid, &self.config.part_sentinel);
        if part_rows.is_empty() {
            return Err(CompileError::no_records(format!(
                "no parts found under '{}' headers",
                self.config.part_sentinel
            )));
        }

        let cell = |row: usize, col: usize| grid.trimmed(row, col).to_string();

        let tasks = project_rows
            .iter()
            .map(|b| RawTask {
                group: b.sequence,
                row: b.row,
                id: cell(b.row, PROJECT_ID),
                title: cell(b.row, PROJECT_TITLE),
                description: cell(b.row, PROJECT_DESCRIPTION),
                dataset_url: Some(cell(b.row, PROJECT_DATASET)),
                solution_file: cell(b.row, PROJECT_SOLUTION_FILE),
            })
            .collect();

        let parts = part_rows
            .iter()
            .map(|b| RawPart {
                group: b.sequence,
                row: b.row,
                part_id: cell(b.row, PART_ID),
                description: cell(b.row, PART_DESCRIPTION),
                expected_text: cell(b.row, PART_EXPECTED),
                validation_method: cell(b.row, PART_VALIDATION),
                threshold: cell(b.row, PART_THRESHOLD),
                ..RawPart::default()
            })
            .collect();

        Ok(Extraction {
            tasks,
            parts,
            issues: Vec::new(),
        })
    }
}
