//! Free-text substring filter over a caller-chosen list of columns

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    /// Substring to look for
    pub filters: String,
    /// Comma-separated column names, optionally `relation.column`
    pub fields: String,
}

impl Filter {
    pub fn new(filters: &str, fields: &str) -> Self {
        Self {
            filters: filters.to_string(),
            fields: fields.to_string(),
        }
    }

    /// Both a needle and at least one column are required for the filter to apply
    pub fn is_active(&self) -> bool {
        !self.filters.is_empty() && !self.fields.trim().is_empty()
    }

    /// Trimmed, non-empty column entries in declaration order
    pub fn columns(&self) -> Vec<&str> {
        self.fields
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .collect()
    }

    /// `%needle%` with LIKE wildcards in the needle escaped
    pub fn pattern(&self) -> String {
        let mut escaped = String::with_capacity(self.filters.len() + 2);
        escaped.push('%');
        for c in self.filters.chars() {
            if matches!(c, '%' | '_' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped.push('%');
        escaped
    }
}
