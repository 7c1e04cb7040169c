//! Shared HTTP response and pagination shapes.

use serde::{Deserialize, Serialize};

/// Paginated response envelope: one page of items plus totals.
#[derive(Debug, Serialize)]
pub struct PaginatedData<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T: Serialize> PaginatedData<T> {
    /// Build an envelope from one page of items and the total row count.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, page: &PageQuery) -> Self {
        Self {
            items,
            pagination: PaginationMeta {
                total,
                page: page.page,
                per_page: page.per_page,
                total_pages: (total as f64 / f64::from(page.per_page)).ceil() as u32,
            },
        }
    }
}

/// Pagination query parameters (1-indexed, fixed default page size).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl PageQuery {
    /// Build from optional query parameters, clamping out-of-range values.
    #[must_use]
    pub fn from_parts(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or_else(default_page),
            per_page: per_page.unwrap_or_else(default_per_page),
        }
        .clamped()
    }

    /// Offset into the full result set.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.per_page as usize
    }

    /// Clamp out-of-range values instead of erroring; list endpoints are
    /// public and a hostile `per_page` should not become a 400 storm.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        if self.page == 0 {
            self.page = 1;
        }
        self.per_page = self.per_page.clamp(1, 100);
        self
    }
}
