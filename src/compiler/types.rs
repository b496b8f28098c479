use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Location;

// ==================== Output Tree ====================

/// Canonical validation category of a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartType {
    TextSimilarity,
    CodeExecution,
    CsvSimilarity,
    RegressionEvaluation,
    NumericalPrediction,
}

impl PartType {
    pub const ALL: [PartType; 5] = [
        PartType::TextSimilarity,
        PartType::CodeExecution,
        PartType::CsvSimilarity,
        PartType::RegressionEvaluation,
        PartType::NumericalPrediction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartType::TextSimilarity => "text_similarity",
            PartType::CodeExecution => "code_execution",
            PartType::CsvSimilarity => "csv_similarity",
            PartType::RegressionEvaluation => "regression_evaluation",
            PartType::NumericalPrediction => "numerical_prediction",
        }
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level question record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Part>,
}

/// A gradable sub-unit of a task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub part_id: String,
    #[serde(rename = "type")]
    pub kind: PartType,
    pub description: String,
    #[serde(flatten)]
    pub fields: PartFields,
}

/// Type-specific validation fields; which variant is present follows `Part::kind`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PartFields {
    Csv(CsvFields),
    Text(TextFields),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvFields {
    pub student_file: String,
    pub placeholder_filename: String,
    pub solution_file: String,
    pub test_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_file: Option<String>,
    pub key_columns: Vec<String>,
    pub similarity_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFields {
    pub expected_text: String,
    pub similarity_threshold: f64,
}

impl PartFields {
    pub fn similarity_threshold(&self) -> f64 {
        match self {
            PartFields::Csv(f) => f.similarity_threshold,
            PartFields::Text(f) => f.similarity_threshold,
        }
    }
}

// ==================== Raw Records ====================

/// Task-level cells pulled out of the sheet before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTask {
    /// Correlation key: sentinel sequence number or group ordinal.
    pub group: usize,
    /// 0-based row the record was read from.
    pub row: usize,
    pub id: String,
    pub title: String,
    pub description: String,
    /// Source URL cell; `None` for dialects without dataset columns.
    pub dataset_url: Option<String>,
    pub solution_file: String,
}

/// Part-level cells pulled out of the sheet before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPart {
    pub group: usize,
    pub row: usize,
    pub part_id: String,
    pub description: String,
    pub validation_method: String,
    pub expected_text: String,
    pub threshold: String,
    pub student_file: String,
    pub placeholder_filename: String,
    pub solution_file: String,
    pub test_file: String,
    pub train_file: String,
    pub key_columns: String,
}

/// A record that could not be used as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordIssue {
    pub location: Location,
    pub message: String,
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Output of an extractor, shared by both dialects
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub tasks: Vec<RawTask>,
    pub parts: Vec<RawPart>,
    pub issues: Vec<RecordIssue>,
}

// ==================== Run Options & Report ====================

/// Spreadsheet layout the compiler should expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// Repeated "Project ID" / "Part ID" sentinel blocks.
    MarkerScan,
    /// A header row and one row per (task, part), keyed by `id`.
    Grouped,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MarkerScan => "marker-scan",
            Dialect::Grouped => "grouped",
        }
    }

    /// The ml subject uses the project sheet layout; everything else is grouped.
    pub fn for_subject(subject: &str) -> Self {
        if subject.trim().eq_ignore_ascii_case("ml") {
            Dialect::MarkerScan
        } else {
            Dialect::Grouped
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a structurally broken record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssemblyPolicy {
    /// Abort the run on the first broken record.
    #[default]
    FailFast,
    /// Skip broken records and list them in the report.
    BestEffort,
}

/// Summary of one compilation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileReport {
    pub source_checksum: String,
    pub tasks: usize,
    pub parts: usize,
    /// Correlation numbers of part blocks with no matching task.
    pub dropped_part_groups: Vec<usize>,
    /// Part rows dropped along with those blocks.
    pub dropped_parts: usize,
    pub skipped: Vec<RecordIssue>,
}

/// Tasks plus the report of how they were built
#[derive(Debug, Clone)]
pub struct Compilation {
    pub dialect: Dialect,
    pub tasks: Vec<Task>,
    pub report: CompileReport,
}
