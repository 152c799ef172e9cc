use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters for page-based listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// 1-based page number (default: 1).
    pub page: Option<i64>,
    /// Number of items per page (max: 100).
    pub limit: Option<i64>,
}

/// Query parameters for the moderation listing.
#[derive(Debug, Default, Deserialize)]
pub struct FlatListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Restrict the listing to one film.
    pub film_id: Option<i64>,
}

/// A normalized page: `page >= 1`, `1 <= limit <= MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Pagination block of list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: (total + request.limit - 1) / request.limit,
        }
    }
}

/// One page of items plus its pagination block.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
