use std::collections::{BTreeMap, HashSet};

use super::normalize::{apply_template, slugify, Normalizer};
use super::types::{
    AssemblyPolicy, CompileReport, CsvFields, Extraction, Part, PartFields, PartType, RawPart,
    RawTask, RecordIssue, Task, TextFields,
};
use crate::config::CsvDefaults;
use crate::error::{CompileError, Location};

/// Templates turning raw id/title cells into task ids and titles
#[derive(Debug, Clone, Copy)]
pub struct TaskNaming<'a> {
    pub id_template: &'a str,
    pub title_template: &'a str,
}

/// Joins extracted records into the task tree.
///
/// Parts attach to every task with the same correlation key; part groups
/// with no task are dropped and counted in the report.
pub struct Assembler<'a> {
    normalizer: Normalizer<'a>,
    csv_defaults: &'a CsvDefaults,
    naming: TaskNaming<'a>,
    policy: AssemblyPolicy,
}

impl<'a> Assembler<'a> {
    pub fn new(
        normalizer: Normalizer<'a>,
        csv_defaults: &'a CsvDefaults,
        naming: TaskNaming<'a>,
        policy: AssemblyPolicy,
    ) -> Self {
        Self {
            normalizer,
            csv_defaults,
            naming,
            policy,
        }
    }

    pub fn assemble(&self, extraction: Extraction) -> Result<(Vec<Task>, CompileReport), CompileError> {
        let mut report = CompileReport::default();

        for issue in extraction.issues {
            self.reject(issue, &mut report)?;
        }

        let mut parts_by_group: BTreeMap<usize, Vec<RawPart>> = BTreeMap::new();
        for part in extraction.parts {
            parts_by_group.entry(part.group).or_default().push(part);
        }

        let task_groups: HashSet<usize> = extraction.tasks.iter().map(|t| t.group).collect();
        for (group, parts) in &parts_by_group {
            if !task_groups.contains(group) {
                tracing::warn!(
                    group,
                    parts = parts.len(),
                    "dropping part block with no matching task"
                );
                report.dropped_part_groups.push(*group);
                report.dropped_parts += parts.len();
            }
        }

        let mut seen_ids = HashSet::new();
        let mut tasks = Vec::with_capacity(extraction.tasks.len());

        for raw in &extraction.tasks {
            let id = apply_template(self.naming.id_template, &raw.id, &raw.title);
            if id.trim().is_empty() {
                self.reject(issue_at(raw, "task id is blank"), &mut report)?;
                continue;
            }
            if !seen_ids.insert(id.clone()) {
                self.reject(issue_at(raw, format!("duplicate task id '{}'", id)), &mut report)?;
                continue;
            }

            let dataset_path = raw
                .dataset_url
                .as_deref()
                .map(|url| self.normalizer.dataset_path(url));

            let parts: Vec<Part> = parts_by_group
                .get(&raw.group)
                .map(|group| {
                    group
                        .iter()
                        .map(|p| self.build_part(p, raw, dataset_path.as_deref().unwrap_or("")))
                        .collect()
                })
                .unwrap_or_default();

            report.parts += parts.len();
            tasks.push(Task {
                id,
                title: apply_template(self.naming.title_template, &raw.id, &raw.title),
                description: raw.description.clone(),
                dataset_source_url: raw.dataset_url.clone(),
                dataset_path,
                parts,
            });
        }

        if tasks.is_empty() {
            return Err(CompileError::no_records("every task record was skipped"));
        }

        report.tasks = tasks.len();
        Ok((tasks, report))
    }

    /// Build a part with exactly the field set its type calls for.
    fn build_part(&self, raw: &RawPart, task: &RawTask, dataset_path: &str) -> Part {
        let kind = self.normalizer.part_type(&raw.validation_method);
        let similarity_threshold = self.normalizer.threshold(&raw.threshold);

        let fields = match kind {
            PartType::CsvSimilarity => {
                let key_columns = match self.normalizer.split_list(&raw.key_columns) {
                    cols if cols.is_empty() => self.csv_defaults.key_columns.clone(),
                    cols => cols,
                };
                PartFields::Csv(CsvFields {
                    student_file: or_default(&raw.student_file, &self.csv_defaults.student_file),
                    placeholder_filename: or_default(
                        &raw.placeholder_filename,
                        &self.csv_defaults.placeholder_filename,
                    ),
                    solution_file: or_default(&raw.solution_file, &task.solution_file),
                    test_file: or_default(&raw.test_file, dataset_path),
                    train_file: (!raw.train_file.is_empty()).then(|| raw.train_file.clone()),
                    key_columns,
                    similarity_threshold,
                })
            }
            _ => PartFields::Text(TextFields {
                expected_text: raw.expected_text.clone(),
                similarity_threshold,
            }),
        };

        Part {
            part_id: slugify(&raw.part_id),
            kind,
            description: raw.description.clone(),
            fields,
        }
    }

    fn reject(&self, issue: RecordIssue, report: &mut CompileReport) -> Result<(), CompileError> {
        match self.policy {
            AssemblyPolicy::FailFast => Err(CompileError::assembly(issue.location, issue.message)),
            AssemblyPolicy::BestEffort => {
                tracing::warn!(location = %issue.location, "skipping record: {}", issue.message);
                report.skipped.push(issue);
                Ok(())
            }
        }
    }
}

fn issue_at(raw: &RawTask, message: impl Into<String>) -> RecordIssue {
    RecordIssue {
        location: Location::row(raw.row),
        message: message.into(),
    }
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;

    const MARKER: TaskNaming<'static> = TaskNaming {
        id_template: "{slug}_full_task_v1",
        title_template: "Linear Regression: {title}",
    };

    fn task(group: usize, id: &str) -> RawTask {
        RawTask {
            group,
            row: group * 10,
            id: id.to_string(),
            title: format!("{id} title"),
            description: "desc".to_string(),
            dataset_url: Some("https://host/files/train.csv?sig=1".to_string()),
            solution_file: "solution.csv".to_string(),
        }
    }

    fn part(group: usize, id: &str, method: &str) -> RawPart {
        RawPart {
            group,
            row: group * 10 + 5,
            part_id: id.to_string(),
            validation_method: method.to_string(),
            expected_text: "expected".to_string(),
            ..RawPart::default()
        }
    }

    fn assemble(extraction: Extraction, policy: AssemblyPolicy) -> Result<(Vec<Task>, CompileReport), CompileError> {
        let normalizer_config = NormalizerConfig::default();
        let csv = CsvDefaults::default();
        let assembler = Assembler::new(Normalizer::new(&normalizer_config), &csv, MARKER, policy);
        assembler.assemble(extraction)
    }

    #[test]
    fn test_correlation_drops_trailing_part_block() {
        let extraction = Extraction {
            tasks: vec![task(1, "Alpha"), task(2, "Beta")],
            parts: vec![
                part(1, "A1", "Text similarity"),
                part(2, "B1", "Text similarity"),
                part(2, "B2", "Code execution"),
                part(3, "C1", "Text similarity"),
            ],
            issues: vec![],
        };
        let (tasks, report) = assemble(extraction, AssemblyPolicy::FailFast).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "alpha_full_task_v1");
        assert_eq!(tasks[0].title, "Linear Regression: Alpha title");
        let ids: Vec<_> = tasks[1].parts.iter().map(|p| p.part_id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
        assert_eq!(tasks[0].parts.len(), 1);
        assert_eq!(report.dropped_part_groups, vec![3]);
        assert_eq!(report.dropped_parts, 1);
        assert_eq!(report.parts, 3);
    }

    #[test]
    fn test_csv_part_fields() {
        let extraction = Extraction {
            tasks: vec![task(1, "Housing")],
            parts: vec![part(1, "Predict Prices", "CSV similarity")],
            issues: vec![],
        };
        let (tasks, _) = assemble(extraction, AssemblyPolicy::FailFast).unwrap();
        let task = &tasks[0];
        assert_eq!(task.dataset_path.as_deref(), Some("data/datasets/ml/train.csv"));

        let part = &task.parts[0];
        assert_eq!(part.kind, PartType::CsvSimilarity);
        match &part.fields {
            PartFields::Csv(f) => {
                assert_eq!(f.student_file, "submission.csv");
                assert_eq!(f.solution_file, "solution.csv");
                assert_eq!(f.test_file, "data/datasets/ml/train.csv");
                assert_eq!(f.key_columns, vec!["Id", "SalePrice"]);
                assert_eq!(f.train_file, None);
                assert_eq!(f.similarity_threshold, 0.9);
            }
            other => panic!("expected csv fields, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_label_falls_back_to_text() {
        let extraction = Extraction {
            tasks: vec![task(1, "Q")],
            parts: vec![part(1, "P", "Eyeball it")],
            issues: vec![],
        };
        let (tasks, _) = assemble(extraction, AssemblyPolicy::FailFast).unwrap();
        let part = &tasks[0].parts[0];
        assert_eq!(part.kind, PartType::TextSimilarity);
        assert_eq!(
            part.fields,
            PartFields::Text(TextFields {
                expected_text: "expected".to_string(),
                similarity_threshold: 0.9,
            })
        );
    }

    #[test]
    fn test_duplicate_id_policies() {
        let extraction = || Extraction {
            tasks: vec![task(1, "Same"), task(2, "Same")],
            parts: vec![],
            issues: vec![],
        };

        let err = assemble(extraction(), AssemblyPolicy::FailFast).unwrap_err();
        assert!(matches!(err, CompileError::Assembly { .. }));

        let (tasks, report) = assemble(extraction(), AssemblyPolicy::BestEffort).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].location, Location::row(20));
    }

    #[test]
    fn test_extraction_issues_follow_policy() {
        let extraction = || Extraction {
            tasks: vec![task(1, "Q")],
            parts: vec![],
            issues: vec![RecordIssue {
                location: Location::cell(3, 0),
                message: "row has content but no task id".to_string(),
            }],
        };
        match assemble(extraction(), AssemblyPolicy::FailFast).unwrap_err() {
            CompileError::Assembly { location, .. } => assert_eq!(location.to_string(), "A4"),
            other => panic!("unexpected error: {other}"),
        }
        let (tasks, report) = assemble(extraction(), AssemblyPolicy::BestEffort).unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].parts.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }
}
