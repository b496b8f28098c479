//! Extraction for sheets with a header row and one row per (task, part).
//!
//! Rows sharing an `id` form one task, in first-seen order. Rows with a blank
//! `part_id` only carry task-level text.

use std::collections::HashMap;

use super::types::{Dialect, Extraction, RawPart, RawTask, RecordIssue};
use super::Extractor;
use crate::config::{GroupedConfig, RepresentativePolicy};
use crate::error::{CompileError, Location};
use crate::excel::{validate_headers, Grid, HeaderSchema, RowView};

pub const GROUPED_SCHEMA: HeaderSchema = HeaderSchema {
    required: &["id", "title", "description", "part_id"],
    optional: &[
        "part_type",
        "part_description",
        "expected_text",
        "similarity_threshold",
        "student_file",
        "placeholder_filename",
        "solution_file",
        "test_file",
        "train_file",
        "key_columns",
    ],
};

/// Pick the title/description text for a group under `policy`.
pub fn representative<'a, I>(values: I, policy: RepresentativePolicy) -> &'a str
where
    I: IntoIterator<Item = &'a str>,
{
    let mut values = values.into_iter();
    match policy {
        RepresentativePolicy::FirstRow => values.next().unwrap_or(""),
        RepresentativePolicy::LongestText => values.fold("", |best, v| {
            if v.chars().count() > best.chars().count() {
                v
            } else {
                best
            }
        }),
    }
}

pub struct GroupedExtractor<'a> {
    config: &'a GroupedConfig,
}

impl<'a> GroupedExtractor<'a> {
    pub fn new(config: &'a GroupedConfig) -> Self {
        Self { config }
    }
}

impl Extractor for GroupedExtractor<'_> {
    fn dialect(&self) -> Dialect {
        Dialect::Grouped
    }

    fn extract(&self, grid: &Grid) -> Result<Extraction, CompileError> {
        if grid.is_empty() {
            return Err(CompileError::no_records("sheet has no header row"));
        }

        let table = grid.with_header(0);
        let check = validate_headers(&table, &GROUPED_SCHEMA);
        if !check.is_valid() {
            return Err(CompileError::assembly(
                Location::row(table.header_row()),
                format!("missing required column(s): {}", check.missing.join(", ")),
            ));
        }
        if !check.unknown.is_empty() {
            tracing::warn!(columns = ?check.unknown, "ignoring unrecognized columns");
        }

        let mut issues = Vec::new();
        let mut order: Vec<(String, Vec<RowView<'_, '_>>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row_idx in table.data_rows() {
            let row = table.row(row_idx);
            if row.is_blank() {
                continue;
            }

            let id = row.get("id");
            if id.is_empty() {
                let id_col = table.column("id").unwrap_or(0);
                issues.push(RecordIssue {
                    location: Location::cell(row_idx, id_col),
                    message: "row has content but no task id".to_string(),
                });
                continue;
            }

            let slot = *index.entry(id.to_string()).or_insert_with(|| {
                order.push((id.to_string(), Vec::new()));
                order.len() - 1
            });
            order[slot].1.push(row);
        }

        if order.is_empty() && issues.is_empty() {
            return Err(CompileError::no_records("no task rows with an 'id' found"));
        }

        let policy = self.config.representative;
        let mut tasks = Vec::with_capacity(order.len());
        let mut parts = Vec::new();

        for (ordinal, (id, rows)) in order.into_iter().enumerate() {
            let group = ordinal + 1;
            let first_row = rows.first().map(|r| r.index()).unwrap_or_default();

            tasks.push(RawTask {
                group,
                row: first_row,
                id,
                title: representative(rows.iter().map(|r| r.get("title")), policy).to_string(),
                description: representative(rows.iter().map(|r| r.get("description")), policy)
                    .to_string(),
                dataset_url: None,
                solution_file: String::new(),
            });

            for row in rows.iter().filter(|r| !r.get("part_id").is_empty()) {
                parts.push(RawPart {
                    group,
                    row: row.index(),
                    part_id: row.get("part_id").to_string(),
                    description: row.get("part_description").to_string(),
                    validation_method: row.get("part_type").to_string(),
                    expected_text: row.get("expected_text").to_string(),
                    threshold: row.get("similarity_threshold").to_string(),
                    student_file: row.get("student_file").to_string(),
                    placeholder_filename: row.get("placeholder_filename").to_string(),
                    solution_file: row.get("solution_file").to_string(),
                    test_file: row.get("test_file").to_string(),
                    train_file: row.get("train_file").to_string(),
                    key_columns: row.get("key_columns").to_string(),
                });
            }
        }

        tracing::debug!(tasks = tasks.len(), parts = parts.len(), "grouped rows");
        Ok(Extraction {
            tasks,
            parts,
            issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [&str; 7] = [
        "id",
        "title",
        "description",
        "part_id",
        "part_type",
        "part_description",
        "expected_text",
    ];

    fn grid(rows: Vec<[&str; 7]>) -> Grid {
        let mut all = vec![HEADER.to_vec()];
        all.extend(rows.into_iter().map(|r| r.to_vec()));
        Grid::from_rows(all)
    }

    #[test]
    fn test_blank_part_id_contributes_no_part() {
        let g = grid(vec![
            ["q1", "Sums", "Add numbers", "p1", "Text similarity", "first", "2"],
            ["q1", "", "", "", "", "", ""],
            ["q2", "Products", "Multiply", "p1", "", "second", "6"],
        ]);
        let config = GroupedConfig::default();
        let extraction = GroupedExtractor::new(&config).extract(&g).unwrap();

        assert_eq!(extraction.tasks.len(), 2);
        assert_eq!(extraction.tasks[0].id, "q1");
        assert_eq!(extraction.tasks[1].id, "q2");
        let q1_parts: Vec<_> = extraction.parts.iter().filter(|p| p.group == 1).collect();
        assert_eq!(q1_parts.len(), 1);
        assert_eq!(q1_parts[0].row, 1);
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let g = grid(vec![
            ["zeta", "", "", "p1", "", "", ""],
            ["alpha", "", "", "p1", "", "", ""],
            ["zeta", "", "", "p2", "", "", ""],
        ]);
        let config = GroupedConfig::default();
        let extraction = GroupedExtractor::new(&config).extract(&g).unwrap();
        let ids: Vec<_> = extraction.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
        let zeta_parts: Vec<_> = extraction
            .parts
            .iter()
            .filter(|p| p.group == 1)
            .map(|p| p.part_id.as_str())
            .collect();
        assert_eq!(zeta_parts, vec!["p1", "p2"]);
    }

    #[test]
    fn test_representative_policies() {
        let values = ["", "short", "the longest one", "also longest!!"];
        assert_eq!(
            representative(values, RepresentativePolicy::LongestText),
            "the longest one"
        );
        assert_eq!(representative(values, RepresentativePolicy::FirstRow), "");
        assert_eq!(representative(Vec::<&str>::new(), RepresentativePolicy::LongestText), "");
    }

    #[test]
    fn test_longest_text_description() {
        let g = grid(vec![
            ["q1", "Sums", "short", "p1", "", "", ""],
            ["q1", "Later title", "a much longer description", "", "", "", ""],
        ]);
        let config = GroupedConfig::default();
        let extraction = GroupedExtractor::new(&config).extract(&g).unwrap();
        assert_eq!(extraction.tasks[0].title, "Later title");
        assert_eq!(extraction.tasks[0].description, "a much longer description");

        let first_row = GroupedConfig {
            representative: RepresentativePolicy::FirstRow,
            ..GroupedConfig::default()
        };
        let extraction = GroupedExtractor::new(&first_row).extract(&g).unwrap();
        assert_eq!(extraction.tasks[0].title, "Sums");
        assert_eq!(extraction.tasks[0].description, "short");
    }

    #[test]
    fn test_missing_required_column() {
        let g = Grid::from_rows(vec![vec!["id", "description", "part_id"], vec!["q1", "d", "p1"]]);
        let config = GroupedConfig::default();
        let err = GroupedExtractor::new(&config).extract(&g).unwrap_err();
        match err {
            CompileError::Assembly { location, message } => {
                assert_eq!(location.row, 1);
                assert!(message.contains("title"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_id_is_reported_and_blank_rows_ignored() {
        let g = grid(vec![
            ["", "", "", "", "", "", ""],
            ["", "Orphan", "", "p1", "", "", ""],
            ["q1", "Sums", "", "p1", "", "", ""],
        ]);
        let config = GroupedConfig::default();
        let extraction = GroupedExtractor::new(&config).extract(&g).unwrap();
        assert_eq!(extraction.tasks.len(), 1);
        assert_eq!(extraction.issues.len(), 1);
        assert_eq!(extraction.issues[0].location.to_string(), "A3");
    }

    #[test]
    fn test_header_only_sheet_has_no_records() {
        let g = grid(vec![]);
        let config = GroupedConfig::default();
        assert!(matches!(
            GroupedExtractor::new(&config).extract(&g),
            Err(CompileError::NoRecordsFound(_))
        ));
    }
}
