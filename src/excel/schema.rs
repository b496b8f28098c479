use super::types::HeaderedGrid;

/// Expected header columns of a table
#[derive(Debug, Clone)]
pub struct HeaderSchema {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

/// Result of checking a header row against a schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderCheck {
    /// Required columns with no matching header.
    pub missing: Vec<String>,
    /// Non-blank headers the schema does not know about.
    pub unknown: Vec<String>,
}

impl HeaderCheck {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Validate the header row of `table` against `schema`
pub fn validate_headers(table: &HeaderedGrid<'_>, schema: &HeaderSchema) -> HeaderCheck {
    let missing = schema
        .required
        .iter()
        .filter(|name| table.column(name).is_none())
        .map(|name| name.to_string())
        .collect();

    let unknown = table
        .headers()
        .iter()
        .filter(|h| !h.is_empty())
        .filter(|h| {
            !schema
                .required
                .iter()
                .chain(schema.optional.iter())
                .any(|known| known.eq_ignore_ascii_case(h))
        })
        .cloned()
        .collect();

    HeaderCheck { missing, unknown }
}
