//! Page-based pagination

use serde::{Deserialize, Serialize};

/// Pagination configuration
///
/// A `page_size` of 0 disables LIMIT/OFFSET entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// `(limit, offset)` for this page, page size clamped to `max_page_size`
    pub fn limit_offset(&self, max_page_size: u32) -> Option<(u64, u64)> {
        if self.page_size == 0 {
            return None;
        }
        let limit = u64::from(self.page_size.min(max_page_size.max(1)));
        let offset = u64::from(self.page.saturating_sub(1)) * limit;
        Some((limit, offset))
    }

    pub fn to_sql(&self, max_page_size: u32) -> String {
        match self.limit_offset(max_page_size) {
            Some((limit, offset)) => format!("LIMIT {} OFFSET {}", limit, offset),
            None => String::new(),
        }
    }
}
