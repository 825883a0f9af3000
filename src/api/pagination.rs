//! Page-number pagination for list endpoints.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::AppError;

/// `?page=&page_size=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// One page of results.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    /// Size of the whole result set
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

/// Resolved page number and size for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page: u32,
    page_size: u32,
}

impl Paginator {
    /// Page numbers start at 1. A missing or zero size falls back to the default;
    /// larger sizes are capped at the configured ceiling.
    pub fn new(page: Option<u32>, page_size: Option<u32>, config: &Config) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::NotFound("Invalid page.".to_string()));
        }

        let page_size = match page_size {
            Some(0) | None => config.page_size,
            Some(size) => size.min(config.max_page_size),
        };

        Ok(Self { page, page_size })
    }

    pub fn from_query(query: &PageQuery, config: &Config) -> Result<Self, AppError> {
        Self::new(query.page, query.page_size, config)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// Wrap a slice fetched with [`limit`](Self::limit) and [`offset`](Self::offset).
    ///
    /// Asking for a page past the end is a 404; page 1 of an empty set is an empty page.
    pub fn page<T: Serialize>(&self, count: i64, results: Vec<T>) -> Result<Page<T>, AppError> {
        if self.page > 1 && self.offset() >= count {
            return Err(AppError::NotFound("Invalid page.".to_string()));
        }

        let next = (self.offset() + self.limit() < count).then(|| self.page + 1);
        let previous = (self.page > 1).then(|| self.page - 1);

        Ok(Page {
            count,
            next,
            previous,
            results,
        })
    }
}
