use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, ValueObject};

pub const DEFAULT_PER_PAGE: u32 = 20;

/// A requested page position (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, per_page: u32) -> DomainResult<Self> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(DomainError::validation("page must be 1 or greater"));
        }
        if per_page == 0 {
            return Err(DomainError::validation("per_page must be 1 or greater"));
        }
        Ok(Self { page, per_page })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Index range of this page within `count` items (empty past the end).
    pub fn bounds(&self, count: usize) -> core::ops::Range<usize> {
        let start = (self.page as usize - 1).saturating_mul(self.per_page as usize);
        let start = start.min(count);
        let end = start.saturating_add(self.per_page as usize).min(count);
        start..end
    }
}

/// Pagination metadata returned with a page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub count: u64,
}

impl ValueObject for Pagination {}

impl Pagination {
    /// There is always at least one (possibly empty) page.
    pub fn derive(request: PageRequest, count: usize) -> Self {
        let per_page = request.per_page() as u64;
        let count = count as u64;
        let pages = count.div_ceil(per_page).max(1);
        Self {
            page: request.page(),
            pages: u32::try_from(pages).unwrap_or(u32::MAX),
            per_page: request.per_page(),
            count,
        }
    }
}
