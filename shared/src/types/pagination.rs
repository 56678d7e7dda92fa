//! Pagination related types for list endpoints

use serde::{Deserialize, Serialize};

/// Maximum number of items per page
const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: u32,

    /// Number of items per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl Pagination {
    /// Create a new pagination with values clamped to the accepted range
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }
}

/// Paginated response wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// The actual data items
    pub data: Vec<T>,

    /// Current page number
    #[serde(default = "default_page")]
    pub page: u32,

    /// Items per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Total number of items
    #[serde(default)]
    pub total: u64,
}

impl<T> PaginatedResponse<T> {
    /// Total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.total == 0 || self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page)) as u32
    }

    /// Whether a further page exists
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if the response is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}
