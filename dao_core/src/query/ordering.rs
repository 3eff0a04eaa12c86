//! Sorting options of a list request

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Caller-chosen sort column and direction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sorting {
    pub sort_by: String,
    pub sort_desc: bool,
}

impl Sorting {
    pub fn new(sort_by: &str, sort_desc: bool) -> Self {
        Self {
            sort_by: sort_by.to_string(),
            sort_desc,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.sort_by.trim().is_empty()
    }

    pub fn order(&self) -> SortOrder {
        if self.sort_desc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}
