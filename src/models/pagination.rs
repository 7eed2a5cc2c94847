//! Pagination request/response helpers shared by listing endpoints

use serde::{Deserialize, Serialize};

/// Page request with 1-based page numbers
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// Pagination metadata returned with list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: Page) -> Self {
        let pages = if page.limit > 0 {
            (total + page.limit - 1) / page.limit
        } else {
            0
        };
        Self {
            total,
            page: page.page,
            limit: page.limit,
            pages,
        }
    }
}
