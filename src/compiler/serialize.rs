use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::types::Task;
use crate::error::CompileError;

/// Write tasks as two-space indented JSON.
///
/// Key order follows struct field order, so unchanged input gives
/// byte-identical output.
pub fn write_tasks<W: Write>(tasks: &[Task], mut writer: W) -> Result<(), CompileError> {
    serde_json::to_writer_pretty(&mut writer, tasks)?;
    writer.flush()?;
    Ok(())
}

pub fn write_tasks_to_path(tasks: &[Task], path: &Path) -> Result<(), CompileError> {
    let file = File::create(path)?;
    write_tasks(tasks, BufWriter::new(file))
}

pub fn to_json_string(tasks: &[Task]) -> Result<String, CompileError> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::types::{Part, PartFields, PartType, TextFields};
    use pretty_assertions::assert_eq;

    fn task(parts: Vec<Part>) -> Task {
        Task {
            id: "algebra_1".to_string(),
            title: "Algebra".to_string(),
            description: "Solve".to_string(),
            dataset_source_url: None,
            dataset_path: None,
            parts,
        }
    }

    #[test]
    fn test_empty_parts_key_is_omitted() {
        let json = to_json_string(&[task(vec![])]).unwrap();
        assert_eq!(
            json,
            "[\n  {\n    \"id\": \"algebra_1\",\n    \"title\": \"Algebra\",\n    \"description\": \"Solve\"\n  }\n]"
        );
    }

    #[test]
    fn test_text_part_layout() {
        let part = Part {
            part_id: "p1".to_string(),
            kind: PartType::TextSimilarity,
            description: "Answer".to_string(),
            fields: PartFields::Text(TextFields {
                expected_text: "42".to_string(),
                similarity_threshold: 0.9,
            }),
        };
        let mut out = Vec::new();
        write_tasks(&[task(vec![part])], &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "id": "algebra_1",
                "title": "Algebra",
                "description": "Solve",
                "parts": [{
                    "part_id": "p1",
                    "type": "text_similarity",
                    "description": "Answer",
                    "expected_text": "42",
                    "similarity_threshold": 0.9
                }]
            }])
        );
    }

    #[test]
    fn test_write_to_missing_directory_is_io_error() {
        let err = write_tasks_to_path(&[], Path::new("/nonexistent-dir/out.json")).unwrap_err();
        assert!(matches!(err, CompileError::Io(_)));
    }
}
