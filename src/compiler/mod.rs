//! Spreadsheet-to-task compiler.
//!
//! Pipeline: read a sheet into a [`Grid`], extract raw records with the
//! dialect's [`Extractor`], then normalize and assemble them into [`Task`]s.
//! Nothing here keeps state between runs.

pub mod types;
pub mod normalize;
pub mod marker_scan;
pub mod grouped;
pub mod assemble;
pub mod serialize;

use std::path::Path;

pub use types::*;
pub use assemble::{Assembler, TaskNaming};
pub use grouped::GroupedExtractor;
pub use marker_scan::MarkerScanExtractor;
pub use normalize::Normalizer;
pub use serialize::{to_json_string, write_tasks, write_tasks_to_path};

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::excel::{self, Grid, ReadOptions, Source};

/// Turns a grid into raw task and part records for one dialect
pub trait Extractor {
    fn dialect(&self) -> Dialect;
    fn extract(&self, grid: &Grid) -> Result<Extraction, CompileError>;
}

impl Dialect {
    pub fn extractor<'a>(&self, config: &'a CompilerConfig) -> Box<dyn Extractor + 'a> {
        match self {
            Dialect::MarkerScan => Box::new(MarkerScanExtractor::new(&config.marker_scan)),
            Dialect::Grouped => Box::new(GroupedExtractor::new(&config.grouped)),
        }
    }

    pub fn naming<'a>(&self, config: &'a CompilerConfig) -> TaskNaming<'a> {
        match self {
            Dialect::MarkerScan => TaskNaming {
                id_template: &config.marker_scan.id_template,
                title_template: &config.marker_scan.title_template,
            },
            Dialect::Grouped => TaskNaming {
                id_template: &config.grouped.id_template,
                title_template: &config.grouped.title_template,
            },
        }
    }
}

/// Per-run choices made by the caller
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub sheet: Option<String>,
    pub policy: AssemblyPolicy,
}

/// Compile one workbook.
pub fn compile(
    source: &Source,
    dialect: Dialect,
    options: &CompileOptions,
    config: &CompilerConfig,
) -> Result<Compilation, CompileError> {
    let read_options = ReadOptions {
        sheet: options.sheet.clone(),
    };
    // One read feeds both the parser and the checksum
    let bytes = excel::read_source_bytes(source)?;
    let grid = excel::read_grid_from_bytes(&bytes, &read_options)?;
    let checksum = excel::checksum_bytes(&bytes);

    let mut compilation = compile_grid(&grid, dialect, options.policy, config)?;
    compilation.report.source_checksum = checksum;

    tracing::info!(
        source = %source.describe(),
        dialect = %dialect,
        tasks = compilation.report.tasks,
        parts = compilation.report.parts,
        dropped_parts = compilation.report.dropped_parts,
        skipped = compilation.report.skipped.len(),
        "compiled workbook"
    );
    Ok(compilation)
}

/// Compile an already-loaded grid.
pub fn compile_grid(
    grid: &Grid,
    dialect: Dialect,
    policy: AssemblyPolicy,
    config: &CompilerConfig,
) -> Result<Compilation, CompileError> {
    let extractor = dialect.extractor(config);
    let extraction = extractor.extract(grid)?;
    tracing::debug!(
        dialect = %extractor.dialect(),
        tasks = extraction.tasks.len(),
        parts = extraction.parts.len(),
        issues = extraction.issues.len(),
        "extracted records"
    );

    let assembler = Assembler::new(
        Normalizer::new(&config.normalizer),
        &config.csv_defaults,
        dialect.naming(config),
        policy,
    );
    let (tasks, report) = assembler.assemble(extraction)?;

    Ok(Compilation {
        dialect,
        tasks,
        report,
    })
}

/// Starter rows for a new workbook in `dialect`.
pub fn template_rows(dialect: Dialect, config: &CompilerConfig) -> Vec<Vec<String>> {
    let row = |cells: &[&str]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();
    match dialect {
        Dialect::MarkerScan => vec![
            row(&[
                config.marker_scan.project_sentinel.as_str(),
                "Title",
                "Description",
                "Dataset Paths",
                "Parts",
                "Expected Outputs",
                "Validation Method",
                "Solution File",
            ]),
            Vec::new(),
            row(&[
                config.marker_scan.part_sentinel.as_str(),
                "Title",
                "Task Description",
                "Expected Output",
                "Validation Method",
                "Similarity Threshold",
                "Dataset Reference",
            ]),
        ],
        Dialect::Grouped => vec![grouped::GROUPED_SCHEMA
            .required
            .iter()
            .chain(grouped::GROUPED_SCHEMA.optional.iter())
            .map(|c| c.to_string())
            .collect()],
    }
}

/// Write a starter workbook for `dialect`, returning its checksum.
pub fn write_template(
    dialect: Dialect,
    path: &Path,
    config: &CompilerConfig,
) -> Result<String, CompileError> {
    excel::export_to_new_file(&template_rows(dialect, config), path, Some("Questions"))
}
