use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::compiler::PartType;

/// Default similarity threshold when a cell is blank or not a number.
pub const DEFAULT_THRESHOLD: f64 = 0.9;
/// Local path template for datasets referenced by URL.
pub const DEFAULT_DATASET_TEMPLATE: &str = "data/datasets/ml/{filename}";
/// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "taskbank.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub normalizer: NormalizerConfig,
    pub csv_defaults: CsvDefaults,
    pub marker_scan: MarkerScanConfig,
    pub grouped: GroupedConfig,
    pub logging: LoggingConfig,
}

/// Vocabulary and fallbacks used by the field normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub default_threshold: f64,
    pub dataset_path_template: String,
    pub list_delimiter: char,
    /// Validation-method labels mapped to part types, matched exactly.
    /// The defaults hold the five sheet labels plus the canonical tags.
    pub validation_methods: BTreeMap<String, PartType>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        let validation_methods = [
            ("Text similarity", PartType::TextSimilarity),
            ("Code execution", PartType::CodeExecution),
            ("CSV similarity", PartType::CsvSimilarity),
            ("Regression evaluation", PartType::RegressionEvaluation),
            ("Numerical prediction", PartType::NumericalPrediction),
        ]
        .into_iter()
        .chain(PartType::ALL.into_iter().map(|kind| (kind.as_str(), kind)))
        .map(|(label, kind)| (label.to_string(), kind))
        .collect();

        Self {
            default_threshold: DEFAULT_THRESHOLD,
            dataset_path_template: DEFAULT_DATASET_TEMPLATE.to_string(),
            list_delimiter: '|',
            validation_methods,
        }
    }
}

/// File names filled into csv_similarity parts when the sheet leaves them blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvDefaults {
    pub student_file: String,
    pub placeholder_filename: String,
    pub key_columns: Vec<String>,
}

impl Default for CsvDefaults {
    fn default() -> Self {
        Self {
            student_file: "submission.csv".to_string(),
            placeholder_filename: "submission.csv".to_string(),
            key_columns: vec!["Id".to_string(), "SalePrice".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerScanConfig {
    pub project_sentinel: String,
    pub part_sentinel: String,
    pub id_template: String,
    pub title_template: String,
}

impl Default for MarkerScanConfig {
    fn default() -> Self {
        Self {
            project_sentinel: "Project ID".to_string(),
            part_sentinel: "Part ID".to_string(),
            id_template: "{slug}_full_task_v1".to_string(),
            title_template: "Linear Regression: {title}".to_string(),
        }
    }
}

/// Which row of a group supplies the task title and description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentativePolicy {
    /// The first row of the group, even if its cell is blank.
    FirstRow,
    /// The longest non-blank cell in the group; ties go to the earlier row.
    #[default]
    LongestText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupedConfig {
    pub id_template: String,
    pub title_template: String,
    pub representative: RepresentativePolicy,
}

impl Default for GroupedConfig {
    fn default() -> Self {
        Self {
            id_template: "{id}".to_string(),
            title_template: "{title}".to_string(),
            representative: RepresentativePolicy::LongestText,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Load configuration.
///
/// An explicit path must exist; otherwise `./taskbank.toml` is used when
/// present, falling back to defaults. Environment overrides apply last.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<CompilerConfig> {
    let path: Option<PathBuf> = match explicit {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file not found: {}", p.display());
            }
            Some(p.to_path_buf())
        }
        None => {
            let local = Path::new(LOCAL_CONFIG_FILE);
            local.exists().then(|| local.to_path_buf())
        }
    };

    let mut cfg = match &path {
        Some(p) => {
            let s = std::fs::read_to_string(p)?;
            parse(&s).map_err(|e| anyhow::anyhow!("{}: {}", p.display(), e))?
        }
        None => CompilerConfig::default(),
    };

    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

pub fn parse(s: &str) -> anyhow::Result<CompilerConfig> {
    Ok(toml::from_str::<CompilerConfig>(s)?)
}

fn apply_env_overrides(cfg: &mut CompilerConfig) -> anyhow::Result<()> {
    if let Ok(v) = std::env::var("TASKBANK_DEFAULT_THRESHOLD") {
        if !v.trim().is_empty() {
            cfg.normalizer.default_threshold = v
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("TASKBANK_DEFAULT_THRESHOLD is not a number: {v}"))?;
        }
    }
    if let Ok(v) = std::env::var("TASKBANK_DATASET_TEMPLATE") {
        if !v.trim().is_empty() {
            cfg.normalizer.dataset_path_template = v;
        }
    }
    Ok(())
}
