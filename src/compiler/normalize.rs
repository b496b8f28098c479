//! Field-level normalization shared by both dialects.
//!
//! Nothing in here fails: unknown labels, blank thresholds and non-URL dataset
//! cells all resolve to documented fallbacks.

use super::types::PartType;
use crate::config::NormalizerConfig;

/// Part-id slug: lowercase, spaces to underscores, `&` to `and`.
pub fn slugify(s: &str) -> String {
    project_slug(s).replace('&', "and")
}

/// Task-id slug: lowercase and spaces to underscores only.
pub fn project_slug(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "_")
}

/// Substitute `{id}`, `{slug}` and `{title}` in a naming template.
pub fn apply_template(template: &str, id: &str, title: &str) -> String {
    template
        .replace("{slug}", &project_slug(id))
        .replace("{id}", id)
        .replace("{title}", title)
}

/// Bare file name of a URL-like string, without query string or fragment.
///
/// Returns `None` when the string does not look like a URL or has no
/// file name component.
pub fn dataset_filename(source: &str) -> Option<String> {
    let source = source.trim();
    if !source.contains("http") {
        return None;
    }
    let without_query = source.split(['?', '#']).next().unwrap_or("");
    let name = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("");
    if name.is_empty() || name.contains(':') {
        return None;
    }
    Some(name.to_string())
}

pub struct Normalizer<'a> {
    config: &'a NormalizerConfig,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: &'a NormalizerConfig) -> Self {
        Self { config }
    }

    /// Map a validation-method label to its part type.
    ///
    /// Labels must match a vocabulary entry exactly (surrounding whitespace
    /// aside). Anything else, blank included, is text similarity.
    pub fn part_type(&self, label: &str) -> PartType {
        self.config
            .validation_methods
            .get(label.trim())
            .copied()
            .unwrap_or(PartType::TextSimilarity)
    }

    /// Numeric threshold, or the configured default when blank or unparsable.
    pub fn threshold(&self, cell: &str) -> f64 {
        match cell.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => self.config.default_threshold,
        }
    }

    /// Split a delimited cell into trimmed, non-empty items.
    pub fn split_list(&self, cell: &str) -> Vec<String> {
        cell.split(self.config.list_delimiter)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Local dataset path for a source URL; empty when the cell is not URL-like.
    pub fn dataset_path(&self, source: &str) -> String {
        match dataset_filename(source) {
            Some(filename) => self
                .config
                .dataset_path_template
                .replace("{filename}", &filename),
            None => String::new(),
        }
    }
}
