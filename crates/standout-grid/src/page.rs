//! Pagination.
//!
//! Pages are 1-indexed. The [`Window`] derived from a [`PageSpec`] applies
//! to row queries only; counts always see the full filtered set.

use serde::Serialize;

/// Items per page when the request does not say.
pub const DEFAULT_ITEMS_PER_PAGE: u64 = 10;

/// A 1-indexed page request. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSpec {
    page: u64,
    items_per_page: u64,
}

impl PageSpec {
    /// Builds a page spec, clamping both values to at least 1.
    pub fn new(page: u64, items_per_page: u64) -> Self {
        PageSpec {
            page: page.max(1),
            items_per_page: items_per_page.max(1),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn items_per_page(&self) -> u64 {
        self.items_per_page
    }

    /// `offset = (page - 1) * items_per_page`, `limit = items_per_page`.
    pub fn window(&self) -> Window {
        Window {
            offset: (self.page - 1).saturating_mul(self.items_per_page),
            limit: self.items_per_page,
        }
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        PageSpec::new(1, DEFAULT_ITEMS_PER_PAGE)
    }
}

/// Offset and limit applied to a row query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    /// Applies the window to an iterator.
    pub fn slice<I: Iterator>(&self, items: I) -> impl Iterator<Item = I::Item> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.skip(offset).take(limit)
    }
}

/// One page of rows and the total across all pages.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult<R> {
    pub rows: Vec<R>,
    pub total: u64,
    pub page: PageSpec,
}

impl<R> QueryResult<R> {
    pub fn new(rows: Vec<R>, total: u64, page: PageSpec) -> Self {
        QueryResult { rows, total, page }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page.items_per_page())
    }

    pub fn is_last_page(&self) -> bool {
        self.page.page() >= self.total_pages()
    }

    pub fn map<T>(self, f: impl FnMut(R) -> T) -> QueryResult<T> {
        QueryResult {
            rows: self.rows.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
        }
    }
}
